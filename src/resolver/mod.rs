// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod dns;
pub mod fixed;

pub use traits::{AddressFamily, HostResolver, ResolutionError, ResolvedAddress};
pub use dns::DnsResolver;
pub use fixed::StaticResolver;
