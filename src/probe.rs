//! Icon Prober
//!
//! An icon only counts as valid once it actually loads. Each vault icon and
//! underlying token icon is fetched; failures are reported back to the store
//! as `IconReport`s through a channel.

use eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::aggregator::{checksum, AggregatedView, IconKind, IconReport};

/// One image to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTarget {
    pub address: alloy_primitives::Address,
    pub kind: IconKind,
    pub url: String,
}

/// Every icon of the listed vaults
pub fn icon_targets(view: &AggregatedView, chain_id: u64) -> Vec<IconTarget> {
    let mut targets = Vec::new();
    for record in view.listed() {
        targets.push(IconTarget {
            address: record.address,
            kind: IconKind::Vault,
            url: record.icon_url(chain_id),
        });
        if let Some(url) = record.token_icon_url(chain_id) {
            targets.push(IconTarget {
                address: record.address,
                kind: IconKind::Token,
                url,
            });
        }
    }
    targets
}

/// Sending half handed to probes
#[derive(Debug, Clone)]
pub struct IconReporter {
    revision: u64,
    tx: mpsc::UnboundedSender<IconReport>,
}

impl IconReporter {
    pub fn new(revision: u64, tx: mpsc::UnboundedSender<IconReport>) -> Self {
        Self { revision, tx }
    }

    /// Returns false once the receiving side is gone
    pub fn report(&self, address: alloy_primitives::Address, kind: IconKind, success: bool) -> bool {
        self.tx
            .send(IconReport {
                revision: self.revision,
                address,
                kind,
                success,
            })
            .is_ok()
    }
}

pub struct IconProber {
    http_client: Client,
    concurrency: usize,
}

impl IconProber {
    pub fn new(timeout_secs: u64, concurrency: usize) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            concurrency: concurrency.max(1),
        })
    }

    async fn loads(&self, url: &str) -> bool {
        match self.http_client.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                trace!("{} → HTTP {}", url, response.status());
                false
            }
            Err(e) => {
                trace!("{} → {}", url, e);
                false
            }
        }
    }

    /// Probe every target and report each outcome. Returns the failure count.
    pub async fn probe(&self, targets: Vec<IconTarget>, reporter: IconReporter) -> usize {
        let start = Instant::now();
        let total = targets.len();

        let failures = stream::iter(targets)
            .map(|target| async move {
                let success = self.loads(&target.url).await;
                if !success {
                    debug!("Broken {} for {}: {}", target.kind, checksum(&target.address), target.url);
                }
                (target, success)
            })
            .buffer_unordered(self.concurrency)
            .fold(0usize, |failures, (target, success)| {
                let reporter = &reporter;
                async move {
                    reporter.report(target.address, target.kind, success);
                    if success {
                        failures
                    } else {
                        failures + 1
                    }
                }
            })
            .await;

        info!(
            "Probed {} icons in {:?}: {} broken",
            total,
            start.elapsed(),
            failures
        );
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::sources::{ApiToken, ApiVault, SourceSnapshot};

    fn view() -> AggregatedView {
        let snapshot = SourceSnapshot {
            vaults: vec![
                ApiVault {
                    address: "0xdA816459F1AB5631232FE5e97a05BBBb94970c95".to_string(),
                    icon: "https://example.org/dai.png".to_string(),
                    token: Some(ApiToken {
                        address: "0x6B175474E89094C44Da98b954EedcdeCB5BE3830".to_string(),
                        icon: String::new(),
                    }),
                    ..Default::default()
                },
                ApiVault {
                    address: "0xa354F35829Ae975e850e23e9615b11Da1B3dC4DE".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        aggregate(&snapshot, 1)
    }

    #[test]
    fn test_icon_targets() {
        let targets = icon_targets(&view(), 1);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].kind, IconKind::Vault);
        assert_eq!(targets[0].url, "https://example.org/dai.png");
        assert_eq!(targets[1].kind, IconKind::Token);
        assert!(targets[1]
            .url
            .to_lowercase()
            .ends_with("/1/0x6b175474e89094c44da98b954eedcdecb5be3830/logo-128.png"));
        assert!(targets[2].url.contains("0xa354F35829Ae975e850e23e9615b11Da1B3dC4DE"));
    }

    #[test]
    fn test_reporter_tags_revision() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = IconReporter::new(7, tx);
        let address = view().listed().next().unwrap().address;

        assert!(reporter.report(address, IconKind::Token, false));
        let report = rx.try_recv().unwrap();
        assert_eq!(report.revision, 7);
        assert_eq!(report.kind, IconKind::Token);
        assert!(!report.success);

        drop(rx);
        assert!(!reporter.report(address, IconKind::Vault, true));
    }

    #[tokio::test]
    async fn test_unreachable_icons_are_reported_broken() {
        let prober = IconProber::new(2, 4).unwrap();
        let address = view().listed().next().unwrap().address;
        let targets = vec![
            IconTarget {
                address,
                kind: IconKind::Vault,
                url: "http://127.0.0.1:9/vault.png".to_string(),
            },
            IconTarget {
                address,
                kind: IconKind::Token,
                url: "http://127.0.0.1:9/token.png".to_string(),
            },
        ];

        let (tx, mut rx) = mpsc::unbounded_channel();
        let failures = prober.probe(targets, IconReporter::new(1, tx)).await;
        assert_eq!(failures, 2);

        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| !r.success && r.revision == 1));
    }

    /// Serves `status` to every request on a local port
    async fn serve_status(status: &'static str) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    status
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_missing_icon_is_broken_but_served_icon_loads() {
        let missing = serve_status("404 Not Found").await;
        let served = serve_status("200 OK").await;

        let prober = IconProber::new(2, 4).unwrap();
        let address = view().listed().next().unwrap().address;
        let targets = vec![
            IconTarget {
                address,
                kind: IconKind::Vault,
                url: format!("http://{}/missing.png", missing),
            },
            IconTarget {
                address,
                kind: IconKind::Token,
                url: format!("http://{}/logo-128.png", served),
            },
        ];

        let (tx, mut rx) = mpsc::unbounded_channel();
        let failures = prober.probe(targets, IconReporter::new(3, tx)).await;
        assert_eq!(failures, 1);

        let mut reports = vec![rx.try_recv().unwrap(), rx.try_recv().unwrap()];
        reports.sort_by_key(|report| report.kind != IconKind::Vault);
        assert_eq!(reports[0].kind, IconKind::Vault);
        assert!(!reports[0].success);
        assert_eq!(reports[1].kind, IconKind::Token);
        assert!(reports[1].success);
        assert!(reports.iter().all(|report| report.revision == 3));
    }
}
