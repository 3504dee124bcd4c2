//! Batch sequencing of the fetch-parse pipeline.
//!
//! One fund identifier flows through discovery, filtering, latest-period
//! selection, download and parsing. Failures are captured per identifier as a
//! failed [`FinancialSnapshot`] carrying the collapsed status code, so one bad
//! fund never aborts the batch.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use fidc_client::FnetClient;
use fidc_core::{FinancialSnapshot, FundId, ProcessingStatus, Result};

/// Pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Courtesy delay between identifiers that generated network traffic.
    pub request_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(2),
        }
    }
}

/// Sequencing orchestrator for a batch of fund identifiers.
///
/// Identifiers are processed strictly one at a time, in input order, and the
/// output table preserves that order with exactly one row per identifier.
#[derive(Debug)]
pub struct EtlPipeline {
    client: FnetClient,
    config: PipelineConfig,
}

impl EtlPipeline {
    /// Creates a pipeline with the default configuration.
    #[must_use]
    pub fn new(client: FnetClient) -> Self {
        Self::with_config(client, PipelineConfig::default())
    }

    /// Creates a pipeline with a custom configuration.
    #[must_use]
    pub const fn with_config(client: FnetClient, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    /// Processes one identifier end to end.
    ///
    /// Also reports whether the identifier generated network traffic, which
    /// drives the inter-identifier delay: a fully cache-served fund owes the
    /// upstream service nothing.
    async fn process_fund(&self, fund: &FundId) -> Result<(FinancialSnapshot, bool)> {
        let discovered = self.client.discover(fund).await?;
        let monthly = FnetClient::filter_monthly(&discovered.value)?;
        let latest = FnetClient::select_latest(&monthly)?;
        let content = self.client.download(latest.id).await?;

        let mut snapshot = fidc_parser::parse(&content.value, fund)?;
        snapshot.document_id = latest.id.to_string();
        snapshot.document_reference_date = latest.reference_period.clone();

        let touched_network = !discovered.from_cache || !content.from_cache;
        Ok((snapshot, touched_network))
    }

    /// Runs the batch, returning one snapshot per input identifier, in input
    /// order.
    ///
    /// Every failure is folded into a failed snapshot via the status
    /// taxonomy. Network-touching identifiers are followed by the configured
    /// courtesy delay, except after the last one; failures count as
    /// network-touching since the failed call usually went out.
    pub async fn run(&self, funds: &[FundId]) -> Vec<FinancialSnapshot> {
        let mut table = Vec::with_capacity(funds.len());
        for (position, fund) in funds.iter().enumerate() {
            info!(%fund, position = position + 1, total = funds.len(), "Processing fund");
            let (snapshot, touched_network) = match self.process_fund(fund).await {
                Ok((snapshot, touched_network)) => (snapshot, touched_network),
                Err(e) => {
                    warn!(%fund, error = %e, "Fund processing failed");
                    (
                        FinancialSnapshot::failed(fund.clone(), e.status(), e.to_string()),
                        true,
                    )
                }
            };
            table.push(snapshot);

            let is_last = position + 1 == funds.len();
            if touched_network && !is_last && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        let counts = summarize(&table);
        info!(
            total = table.len(),
            success = counts.get(&ProcessingStatus::Success).copied().unwrap_or(0),
            "Batch finished"
        );
        table
    }
}

/// Counts snapshots per status code.
#[must_use]
pub fn summarize(table: &[FinancialSnapshot]) -> HashMap<ProcessingStatus, usize> {
    let mut counts = HashMap::new();
    for snapshot in table {
        *counts.entry(snapshot.status).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use fidc_cache::InMemoryCache;
    use fidc_client::ClientConfig;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline(server: &MockServer) -> EtlPipeline {
        let config = ClientConfig {
            search_url: format!("{}/search", server.uri()),
            download_url: format!("{}/download", server.uri()),
            backoff_base: Duration::from_millis(10),
            ..ClientConfig::default()
        };
        let client = FnetClient::with_config(config, Arc::new(InMemoryCache::new()));
        EtlPipeline::with_config(
            client,
            PipelineConfig {
                request_delay: Duration::ZERO,
            },
        )
    }

    fn search_body(id: u64) -> serde_json::Value {
        serde_json::json!({
            "data": [{
                "id": id,
                "denominacaoSocial": "FIDC Teste",
                "tipoDocumento": "Informe Mensal",
                "situacaoDocumento": "A",
                "dataReferencia": "01/2025"
            }]
        })
    }

    const FILING: &str = r"<DOC_ARQ>
        <NR_CNPJ_FUNDO>51199121000145</NR_CNPJ_FUNDO>
        <VL_SOM_APLIC_ATIVO>1.000.000,00</VL_SOM_APLIC_ATIVO>
        <VL_DISPONIB>50.000,00</VL_DISPONIB>
        <CRED_EXISTE>
            <VL_SOM_DICRED_AQUIS>800.000,00</VL_SOM_DICRED_AQUIS>
            <VL_CRED_EXISTE_INAD>40.000,00</VL_CRED_EXISTE_INAD>
        </CRED_EXISTE>
    </DOC_ARQ>";

    #[tokio::test]
    async fn batch_mixes_successes_and_captured_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("cnpjFundo", "51199121000145"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(42)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("cnpjFundo", "00000000999999"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .and(query_param("id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BASE64.encode(FILING)))
            .mount(&server)
            .await;

        let funds = vec![FundId::new("51199121000145"), FundId::new("999999")];
        let table = pipeline(&server).run(&funds).await;

        assert_eq!(table.len(), 2);
        // Input order is preserved.
        assert_eq!(table[0].fund_id, funds[0]);
        assert_eq!(table[1].fund_id, funds[1]);

        assert_eq!(table[0].status, ProcessingStatus::Success);
        assert_eq!(table[0].document_id, "42");
        assert_eq!(table[0].document_reference_date, "01/2025");
        assert!((table[0].npl_ratio_pct - 5.0).abs() < 1e-12);

        assert_eq!(table[1].status, ProcessingStatus::NoDocuments);
        assert!(table[1].error_message.is_some());
        assert_eq!(table[1].total_assets, 0.0);

        let counts = summarize(&table);
        assert_eq!(counts[&ProcessingStatus::Success], 1);
        assert_eq!(counts[&ProcessingStatus::NoDocuments], 1);
    }

    #[tokio::test]
    async fn inactive_only_documents_collapse_to_no_monthly_filing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": 7,
                    "tipoDocumento": "Informe Mensal",
                    "situacaoDocumento": "I",
                    "dataReferencia": "01/2025"
                }]
            })))
            .mount(&server)
            .await;

        let table = pipeline(&server).run(&[FundId::new("1")]).await;
        assert_eq!(table[0].status, ProcessingStatus::NoMonthlyFiling);
    }

    #[tokio::test]
    async fn unparseable_content_collapses_to_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(9)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BASE64.encode("not xml <")))
            .mount(&server)
            .await;

        let table = pipeline(&server).run(&[FundId::new("1")]).await;
        assert_eq!(table[0].status, ProcessingStatus::ParseError);
    }
}
