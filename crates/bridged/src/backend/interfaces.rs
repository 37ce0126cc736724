//! Enumeration of the host's network interfaces.

use std::net::Ipv4Addr;

use super::{BackendError, BackendResult, InterfaceMap, NetworkInterface};

/// Lists every interface that has at least one IP address.
///
/// Interfaces without an IPv4 or IPv6 address (for example bare link-layer
/// entries) are left out.
#[cfg(unix)]
pub(crate) fn system_interfaces() -> BackendResult<InterfaceMap> {
    use std::collections::BTreeMap;
    use std::net::{SocketAddrV4, SocketAddrV6};

    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;

    let entries: Vec<_> = getifaddrs()
        .map_err(|error| BackendError::new(format!("failed to list network interfaces: {error}")))?
        .collect();

    let mut macs: BTreeMap<String, String> = BTreeMap::new();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    for entry in &entries {
        if let Some(octets) = entry
            .address
            .as_ref()
            .and_then(|address| address.as_link_addr())
            .and_then(nix::sys::socket::LinkAddr::addr)
        {
            macs.insert(entry.interface_name.clone(), format_mac(&octets));
        }
    }

    let mut interfaces = InterfaceMap::new();
    for entry in &entries {
        let Some(address) = entry.address.as_ref() else {
            continue;
        };
        let internal = entry.flags.contains(InterfaceFlags::IFF_LOOPBACK);
        let mac = macs.get(&entry.interface_name).cloned().unwrap_or_default();
        let record = if let Some(v4) = address.as_sockaddr_in() {
            let ip = *SocketAddrV4::from(*v4).ip();
            let mask = entry
                .netmask
                .as_ref()
                .and_then(|netmask| netmask.as_sockaddr_in())
                .map_or(Ipv4Addr::UNSPECIFIED, |netmask| {
                    *SocketAddrV4::from(*netmask).ip()
                });
            ipv4_interface(ip, mask, mac, internal)
        } else if let Some(v6) = address.as_sockaddr_in6() {
            NetworkInterface {
                address: SocketAddrV6::from(*v6).ip().to_string(),
                netmask: String::new(),
                family: "IPv6".to_owned(),
                mac,
                internal,
                cidr: None,
            }
        } else {
            continue;
        };
        interfaces
            .entry(entry.interface_name.clone())
            .or_default()
            .push(record);
    }
    Ok(interfaces)
}

/// Interface enumeration is only wired up for Unix hosts.
#[cfg(not(unix))]
pub(crate) fn system_interfaces() -> BackendResult<InterfaceMap> {
    Ok(InterfaceMap::new())
}

fn ipv4_interface(ip: Ipv4Addr, mask: Ipv4Addr, mac: String, internal: bool) -> NetworkInterface {
    NetworkInterface {
        address: ip.to_string(),
        netmask: mask.to_string(),
        family: "IPv4".to_owned(),
        mac,
        internal,
        cidr: Some(format!("{ip}/{}", prefix_length(mask))),
    }
}

/// Counts the leading one bits of a subnet mask.
fn prefix_length(mask: Ipv4Addr) -> u32 {
    u32::from(mask).leading_ones()
}

#[cfg_attr(
    not(any(target_os = "linux", target_os = "android")),
    expect(dead_code, reason = "hardware addresses are only read on Linux")
)]
fn format_mac(octets: &[u8]) -> String {
    octets
        .iter()
        .map(|octet| format!("{octet:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
