use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let addr: u32 = addr.into();
        u32::from(self.start_addr) <= addr && addr <= u32::from(self.end_addr)
    }

    /// Number of addresses in the range, both ends included.
    pub fn len(&self) -> u64 {
        let start: u32 = self.start_addr.into();
        let end: u32 = self.end_addr.into();
        u64::from(end.saturating_sub(start)) + 1
    }

    pub fn is_empty(&self) -> bool {
        u32::from(self.start_addr) > u32::from(self.end_addr)
    }
}

/// Network and broadcast addresses of `ip/prefix`.
///
/// `prefix` must already be within `0..=32`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> Ipv4Range {
    let mask: u32 = match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    };
    let network: u32 = u32::from(ip) & mask;
    let broadcast: u32 = network | !mask;

    Ipv4Range::new(Ipv4Addr::from(network), Ipv4Addr::from(broadcast))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_range_masks_host_bits() {
        let range: Ipv4Range = cidr_range(Ipv4Addr::new(192, 168, 1, 77), 24);
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(range.len(), 256);
    }

    #[test]
    fn cidr_range_edges() {
        let all: Ipv4Range = cidr_range(Ipv4Addr::new(10, 1, 2, 3), 0);
        assert_eq!(all.start_addr, Ipv4Addr::UNSPECIFIED);
        assert_eq!(all.end_addr, Ipv4Addr::BROADCAST);
        assert_eq!(all.len(), 1 << 32);

        let single: Ipv4Range = cidr_range(Ipv4Addr::new(10, 1, 2, 3), 32);
        assert_eq!(single.start_addr, Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(single.end_addr, Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
    }

    #[test]
    fn contains_is_inclusive() {
        let range: Ipv4Range = cidr_range(Ipv4Addr::new(172, 16, 0, 0), 30);
        assert!(range.contains(Ipv4Addr::new(172, 16, 0, 0)));
        assert!(range.contains(Ipv4Addr::new(172, 16, 0, 3)));
        assert!(!range.contains(Ipv4Addr::new(172, 16, 0, 4)));
    }
}
