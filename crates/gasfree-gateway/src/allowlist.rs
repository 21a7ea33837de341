//! Caller allow-list enforced ahead of every route.

use axum::{
	extract::{ConnectInfo, Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
use gasfree_types::APIError;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Set of caller IPs allowed to reach the gateway.
///
/// Entries and callers are both canonicalized, so `::ffff:127.0.0.1` and
/// `127.0.0.1` are the same caller.
#[derive(Debug, Clone)]
pub struct AllowList {
	addresses: HashSet<IpAddr>,
}

impl AllowList {
	pub fn new(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
		Self {
			addresses: addresses.into_iter().map(|ip| ip.to_canonical()).collect(),
		}
	}

	pub fn permits(&self, caller: IpAddr) -> bool {
		self.addresses.contains(&caller.to_canonical())
	}
}

/// Rejects callers outside the allow-list with 403 before the request body
/// is read.
pub async fn enforce_allowlist(
	State(allow_list): State<Arc<AllowList>>,
	ConnectInfo(peer): ConnectInfo<SocketAddr>,
	request: Request,
	next: Next,
) -> Response {
	if !allow_list.permits(peer.ip()) {
		tracing::warn!(
			caller = %peer.ip(),
			method = %request.method(),
			path = %request.uri().path(),
			"Access denied: caller not in allow-list"
		);
		return APIError::Forbidden {
			message: format!("Caller {} is not allowed", peer.ip()),
		}
		.into_response();
	}
	next.run(request).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{Ipv4Addr, Ipv6Addr};

	#[test]
	fn test_mapped_and_plain_forms_match() {
		let list = AllowList::new([IpAddr::V4(Ipv4Addr::LOCALHOST)]);
		let mapped = IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped());

		assert!(list.permits(IpAddr::V4(Ipv4Addr::LOCALHOST)));
		assert!(list.permits(mapped));
		assert!(!list.permits(IpAddr::V6(Ipv6Addr::LOCALHOST)));
		assert!(!list.permits("10.0.0.1".parse().unwrap()));
	}

	#[test]
	fn test_mapped_entry_admits_plain_caller() {
		let list = AllowList::new(["::ffff:10.0.0.9".parse::<IpAddr>().unwrap()]);
		assert!(list.permits("10.0.0.9".parse().unwrap()));
	}
}
