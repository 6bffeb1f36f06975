#![deny(unsafe_code)]
#![deny(warnings)]
//! Network bring-up helpers
//!
//! Blocks the boot sequence until the W5500 reports link and the stack has
//! an IPv4 configuration, logging progress the same way on every board.

use defmt::info;
use embassy_net::Stack;
use embassy_time::Timer;

/// Poll the PHY every 100 ms until the link is up
pub async fn wait_for_link(stack: &Stack<'_>) {
    while !stack.is_link_up() {
        Timer::after_millis(100).await;
        info!("Waiting for Ethernet connection...");
    }
}

/// Wait for network configuration (static or DHCP) and log IP address
pub async fn wait_for_config(stack: &Stack<'_>) {
    stack.wait_config_up().await;
    info!("Network is UP!");

    if let Some(config) = stack.config_v4() {
        let octets = config.address.address().octets();
        info!(
            "Connected! IP address: {}.{}.{}.{}",
            octets[0], octets[1], octets[2], octets[3]
        );

        if let Some(gateway) = config.gateway {
            let gw_octets = gateway.octets();
            info!(
                "Gateway: {}.{}.{}.{}",
                gw_octets[0], gw_octets[1], gw_octets[2], gw_octets[3]
            );
        }
    }
}
