//! Environmental sensor primitives

/// Temperature and humidity sensor
///
/// Each primitive reports `f32::NAN` when the sensor could not produce a
/// value (wiring fault, checksum error, bus timing glitch). The two reads
/// fail independently; callers decide what a partial failure means.
///
/// # Example Implementation
///
/// ```ignore
/// impl EnvironmentSensor for Dht22<'_> {
///     async fn read_humidity(&mut self) -> f32 {
///         self.measure().await.map_or(f32::NAN, |m| m.humidity_percent())
///     }
///
///     async fn read_temperature(&mut self) -> f32 {
///         self.measure().await.map_or(f32::NAN, |m| m.temperature_celsius())
///     }
/// }
/// ```
pub trait EnvironmentSensor {
    /// Relative humidity in percent, or NaN on fault
    fn read_humidity(&mut self) -> impl core::future::Future<Output = f32>;

    /// Temperature in degrees Celsius, or NaN on fault
    fn read_temperature(&mut self) -> impl core::future::Future<Output = f32>;
}
