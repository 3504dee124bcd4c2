#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fidc-data/fidc-data/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::debug;

use fidc_core::convert::brazilian_decimal;
use fidc_core::{Error, FieldKind, FieldValue, FinancialSnapshot, FundId, Result};

/// Element text indexed by extraction path.
///
/// Every text node is registered under its element's local name and, when
/// nested, under `PARENT/LEAF` as well. The first occurrence in document
/// order wins; later duplicates are ignored, matching how the filing repeats
/// summary elements across sections.
#[derive(Debug, Default)]
struct DocumentMap {
    values: HashMap<String, String>,
}

impl DocumentMap {
    /// Builds the map in a single streaming pass over the document.
    fn build(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut map = Self::default();
        let mut stack: Vec<String> = Vec::new();
        let mut saw_element = false;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    saw_element = true;
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Parse(format!("Bad text node: {e}")))?;
                    map.register(&stack, text.trim());
                }
                Ok(Event::CData(t)) => {
                    let text = String::from_utf8_lossy(&t).into_owned();
                    map.register(&stack, text.trim());
                }
                Ok(Event::Eof) => {
                    if let Some(open) = stack.last() {
                        return Err(Error::Parse(format!("Unclosed element <{open}>")));
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(Error::Parse(format!("Malformed document: {e}"))),
            }
            buf.clear();
        }

        if !saw_element {
            return Err(Error::Parse("Document has no elements".to_string()));
        }
        debug!(paths = map.values.len(), "Document map built");
        Ok(map)
    }

    fn register(&mut self, stack: &[String], text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(leaf) = stack.last() else { return };
        self.values
            .entry(leaf.clone())
            .or_insert_with(|| text.to_string());
        if stack.len() >= 2 {
            let parent = &stack[stack.len() - 2];
            self.values
                .entry(format!("{parent}/{leaf}"))
                .or_insert_with(|| text.to_string());
        }
    }

    /// Extracts one field, typed by the path's static classification.
    ///
    /// Missing elements yield `Text("")` or `Numeric(0.0)`. The locale
    /// conversion happens here and nowhere else.
    fn field(&self, path: &str) -> FieldValue {
        let raw = self.values.get(path).cloned().unwrap_or_default();
        match FieldKind::of_path(path) {
            FieldKind::Text => FieldValue::Text(raw),
            FieldKind::Numeric => FieldValue::Numeric(brazilian_decimal(&raw)),
        }
    }

    fn num(&self, path: &str) -> f64 {
        self.field(path).as_numeric()
    }

    fn text(&self, path: &str) -> String {
        self.field(path).to_string()
    }
}

/// Parses one monthly-filing document into a [`FinancialSnapshot`].
///
/// `fund` is the identifier the document was requested for; it backstops the
/// fund identification when the filing itself omits its CNPJ element. Fields
/// absent from the document default to `""` / `0.0` rather than failing, so
/// structurally valid but sparse filings still produce a usable record. The
/// derived indicators are computed here, from the converted numeric fields.
///
/// # Errors
/// [`Error::Parse`] when the document is not well-formed XML or is empty.
pub fn parse(xml: &[u8], fund: &FundId) -> Result<FinancialSnapshot> {
    let doc = DocumentMap::build(xml)?;

    let reported_id = doc.text("NR_CNPJ_FUNDO");
    let fund_id = if reported_id.is_empty() {
        fund.clone()
    } else {
        FundId::new(reported_id)
    };

    let total_assets = doc.num("VL_SOM_APLIC_ATIVO");
    let available_funds = doc.num("VL_DISPONIB");
    let acquired_receivables = doc.num("CRED_EXISTE/VL_SOM_DICRED_AQUIS");
    let credit_delinquency = doc.num("CRED_EXISTE/VL_CRED_EXISTE_INAD");
    let receivables_delinquency = doc.num("DICRED/VL_DICRED_EXISTE_INAD");

    let consolidated =
        fidc_core::indicators::consolidated_delinquency(credit_delinquency, receivables_delinquency);
    let npl = fidc_core::indicators::npl_ratio(consolidated, acquired_receivables);
    let liquidity = fidc_core::indicators::liquidity_ratio(available_funds, total_assets);
    let concentration =
        fidc_core::indicators::concentration_ratio(acquired_receivables, total_assets);

    Ok(FinancialSnapshot {
        fund_id,
        administrator_id: doc.text("NR_CNPJ_ADM"),
        reference_period: doc.text("DT_COMPT"),
        condominium_type: doc.text("TP_CONDOMINIO"),
        exclusive_fund: doc.text("FDO_EXCL"),
        single_class: doc.text("CLASS_UNICA"),
        linked_quotaholder: doc.text("COTST_VINCUL"),

        total_assets,
        available_funds,
        total_portfolio: doc.num("VL_CARTEIRA"),
        other_assets_total: doc.num("VL_SOM_OUTROS_ATIVOS"),
        other_assets_short_term: doc.num("OUTROS_ATIVOS/VL_OUTRO_VL_RECEB_CURPRZ"),
        other_assets_long_term: doc.num("OUTROS_ATIVOS/VL_OUTRO_VL_RECEB_LPRAZO"),

        acquired_receivables,
        credit_overdue_performing: doc.num("CRED_EXISTE/VL_CRED_EXISTE_VENC_ADIMPL"),
        credit_overdue_delinquent: doc.num("CRED_EXISTE/VL_CRED_EXISTE_VENC_INAD"),
        credit_total_overdue_delinquent: doc.num("CRED_EXISTE/VL_CRED_TOTAL_VENC_INAD"),
        credit_delinquency,
        credit_performed: doc.num("CRED_EXISTE/VL_CRED_REFER_DICRED_PERFO"),
        credit_overdue_pending: doc.num("CRED_EXISTE/VL_CRED_VENC_PEND"),
        credit_recovery_origin: doc.num("CRED_EXISTE/VL_CRED_ORIGEM_EMP_PROC_RECUP"),
        credit_public_revenue: doc.num("CRED_EXISTE/VL_DECOR_RECEIT_PUBLIC"),
        credit_court_action: doc.num("CRED_EXISTE/VL_CRED_ACAO_JUDIC"),
        credit_legal_risk: doc.num("CRED_EXISTE/VL_CRED_CONST_JUR_FATRISC"),
        credit_loss_provision: doc.num("CRED_EXISTE/VL_PROVIS_REDUC_RECUP"),

        receivables_total: doc.num("DICRED/VL_DICRED"),
        receivables_assignor: doc.num("DICRED/VL_DICRED_CEDENT"),
        receivables_overdue_delinquent: doc.num("DICRED/VL_DICRED_EXISTE_VENC_INAD"),
        receivables_total_overdue_delinquent: doc.num("DICRED/VL_DICRED_TOTAL_VENC_INAD"),
        receivables_delinquency,
        receivables_performed: doc.num("DICRED/VL_DICRED_REFER_DICRED_PERFO"),
        receivables_overdue_pending: doc.num("DICRED/VL_DICRED_VENC_PEND"),
        receivables_recovery_origin: doc.num("DICRED/VL_DICRED_ORIGEM_EMP_PROC_RECUP"),
        receivables_public_revenue: doc.num("DICRED/VL_DICRED_RECEIT_PUBLIC"),
        receivables_court_action: doc.num("DICRED/VL_DICRED_ACAO_JUDIC"),
        receivables_loss_provision: doc.num("DICRED/VL_DICRED_PROVIS_REDUC_RECUP"),

        securities_total: doc.num("VALORES_MOB/VL_SOM_VALORES_MOB"),
        debentures: doc.num("VALORES_MOB/VL_DEBT"),
        real_estate_certificates: doc.num("VALORES_MOB/VL_CRI"),
        commercial_notes: doc.num("VALORES_MOB/VL_NP_COMERC"),
        financial_bills: doc.num("VALORES_MOB/VL_LETRA_FINANC"),
        fif_quotas: doc.num("VALORES_MOB/VL_CLS_COTA_FIF"),
        other_credit_securities: doc.num("VALORES_MOB/VL_OUTRO_DICRED"),

        federal_bonds: doc.num("VL_TITPUB_FED"),
        bank_certificates: doc.num("VL_CDB"),
        repo_operations: doc.num("VL_APLIC_OPER_COMPSS"),
        fixed_income_assets: doc.num("VL_ATIV_FINANC_RF"),
        fidc_quotas: doc.num("VL_COTA_FIDC"),

        derivatives_total: doc.num("MERC_DERIVATIVO/VL_SOM_MERC_DERIVATIVO"),
        forward_long_position: doc.num("MERC_DERIVATIVO/VL_MERC_TERMO_POS_COMPRD"),
        options_holder_position: doc.num("MERC_DERIVATIVO/VL_MERC_OP_POS_TITUL"),
        futures_positive_adjustment: doc.num("MERC_DERIVATIVO/VL_MERC_FUT_AJUST_POSIT"),
        swap_receivable: doc.num("MERC_DERIVATIVO/VL_DIFER_SWAP_RECEB"),
        coverage_provided: doc.num("MERC_DERIVATIVO/VL_COBERT_PREST"),
        margin_deposits: doc.num("MERC_DERIVATIVO/VL_DEPOS_MARGEM"),

        segmented_portfolio_total: doc.num("CART_SEGMT/VL_SOM_CART_SEGMT"),
        segment_industrial: doc.num("CART_SEGMT/VL_IND"),
        segment_real_estate: doc.num("CART_SEGMT/VL_MERC_IMOBIL"),
        segment_agribusiness: doc.num("CART_SEGMT/VL_AGRONEG"),
        segment_credit_card: doc.num("CART_SEGMT/VL_CART_CRED"),
        segment_court_action: doc.num("CART_SEGMT/VL_ACAO_JUDIC"),
        segment_intellectual_property: doc.num("CART_SEGMT/VL_PROPRD_MARCA_PATENT"),
        segment_commercial_total: doc.num("SEGMT_COMERC/VL_SOM_SEGMT_COMERC"),
        segment_commerce: doc.num("SEGMT_COMERC/VL_COMERC"),
        segment_retail: doc.num("SEGMT_COMERC/VL_COMERC_VARJ"),
        segment_leasing: doc.num("SEGMT_COMERC/VL_ARREND_MERCNT"),
        segment_services_total: doc.num("SEGMT_SERV/VL_SOM_SEGMT_SERV"),
        segment_services: doc.num("SEGMT_SERV/VL_SERV"),
        segment_public_services: doc.num("SEGMT_SERV/VL_SERV_PUBLIC"),
        segment_education_services: doc.num("SEGMT_SERV/VL_SERV_EDUC"),
        segment_entertainment_services: doc.num("SEGMT_SERV/VL_SERV_ENTRETEN"),
        segment_financial_total: doc.num("SEGMT_FINANC/VL_SOM_SEGMT_FINANC"),
        segment_personal_credit: doc.num("SEGMT_FINANC/VL_FINANC_CRED_PESSOA"),
        segment_payroll_credit: doc.num("SEGMT_FINANC/VL_FINANC_CRED_PESSOA_CONSIG"),
        segment_corporate_credit: doc.num("SEGMT_FINANC/VL_FINANC_CRED_CORPOR"),
        segment_middle_market: doc.num("SEGMT_FINANC/VL_FINANC_MMARKET"),
        segment_vehicle_credit: doc.num("SEGMT_FINANC/VL_FINANC_VEICL"),
        segment_corporate_real_estate: doc.num("SEGMT_FINANC/VL_FINANC_IMOBIL_EMPSRL"),
        segment_residential_real_estate: doc.num("SEGMT_FINANC/VL_FINANC_IMOBIL_RESID"),
        segment_financial_other: doc.num("SEGMT_FINANC/VL_FINANC_OUTRO"),
        segment_factoring_total: doc.num("SEGMT_FACT/VL_SOM_SEGMT_FACT"),
        segment_factoring_personal: doc.num("SEGMT_FACT/VL_FACT_PESSOA"),
        segment_factoring_corporate: doc.num("SEGMT_FACT/VL_FACT_CORPOR"),
        segment_public_sector_total: doc.num("SEGMT_SETOR_PUBLIC/VL_SOM_SEGMT_SETOR_PUBLIC"),
        segment_court_ordered_debt: doc.num("SEGMT_SETOR_PUBLIC/VL_SETOR_PUBLIC_PRECAT"),
        segment_tax_credits: doc.num("SEGMT_SETOR_PUBLIC/VL_SETOR_PUBLIC_CRED_TRIBUT"),
        segment_royalties: doc.num("SEGMT_SETOR_PUBLIC/VL_SETOR_PUBLIC_ROYA"),
        segment_public_sector_other: doc.num("SEGMT_SETOR_PUBLIC/VL_SETOR_PUBLIC_OUTRO"),

        consolidated_delinquency: consolidated,
        gross_portfolio: acquired_receivables,
        npl_ratio_pct: npl.percentage,
        npl_ratio: npl.decimal,
        liquidity_ratio_pct: liquidity.percentage,
        liquidity_ratio: liquidity.decimal,
        concentration_ratio_pct: concentration.percentage,
        concentration_ratio: concentration.decimal,

        ..FinancialSnapshot::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fidc_core::ProcessingStatus;

    const FILING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DOC_ARQ>
  <CAB_INFORM>
    <NR_CNPJ_FUNDO>51.199.121/0001-45</NR_CNPJ_FUNDO>
    <NR_CNPJ_ADM>11.222.333/0001-44</NR_CNPJ_ADM>
    <DT_COMPT>01/2025</DT_COMPT>
  </CAB_INFORM>
  <INFORME_MENSAL>
    <TP_CONDOMINIO>Fechado</TP_CONDOMINIO>
    <FDO_EXCL>N</FDO_EXCL>
    <CLASS_UNICA>S</CLASS_UNICA>
    <COTST_VINCUL>N</COTST_VINCUL>
    <VL_SOM_APLIC_ATIVO>1.000.000,00</VL_SOM_APLIC_ATIVO>
    <VL_DISPONIB>50.000,00</VL_DISPONIB>
    <VL_CARTEIRA>950.000,00</VL_CARTEIRA>
    <CRED_EXISTE>
      <VL_SOM_DICRED_AQUIS>800.000,00</VL_SOM_DICRED_AQUIS>
      <VL_CRED_EXISTE_INAD>40.000,00</VL_CRED_EXISTE_INAD>
      <VL_PROVIS_REDUC_RECUP>1.500,25</VL_PROVIS_REDUC_RECUP>
    </CRED_EXISTE>
    <DICRED>
      <VL_DICRED>200.000,00</VL_DICRED>
      <VL_DICRED_EXISTE_INAD>10.000,00</VL_DICRED_EXISTE_INAD>
    </DICRED>
    <VALORES_MOB>
      <VL_DEBT>5.000,00</VL_DEBT>
    </VALORES_MOB>
    <VL_CDB>7.500,00</VL_CDB>
    <SEGMT_FINANC>
      <VL_SOM_SEGMT_FINANC>600.000,00</VL_SOM_SEGMT_FINANC>
      <VL_FINANC_VEICL>400.000,00</VL_FINANC_VEICL>
    </SEGMT_FINANC>
  </INFORME_MENSAL>
</DOC_ARQ>"#;

    #[test]
    fn full_filing_extracts_fields_and_derives_indicators() {
        let fund = FundId::new("51199121000145");
        let snapshot = parse(FILING.as_bytes(), &fund).unwrap();

        assert_eq!(snapshot.fund_id.as_str(), "51199121000145");
        assert_eq!(snapshot.administrator_id, "11.222.333/0001-44");
        assert_eq!(snapshot.reference_period, "01/2025");
        assert_eq!(snapshot.condominium_type, "Fechado");
        assert_eq!(snapshot.single_class, "S");

        assert_eq!(snapshot.total_assets, 1_000_000.0);
        assert_eq!(snapshot.available_funds, 50_000.0);
        assert_eq!(snapshot.total_portfolio, 950_000.0);
        assert_eq!(snapshot.acquired_receivables, 800_000.0);
        assert_eq!(snapshot.credit_delinquency, 40_000.0);
        assert_eq!(snapshot.credit_loss_provision, 1_500.25);
        assert_eq!(snapshot.receivables_total, 200_000.0);
        assert_eq!(snapshot.receivables_delinquency, 10_000.0);
        assert_eq!(snapshot.debentures, 5_000.0);
        assert_eq!(snapshot.bank_certificates, 7_500.0);
        assert_eq!(snapshot.segment_vehicle_credit, 400_000.0);

        // Delinquency consolidates to the larger scheme.
        assert_eq!(snapshot.consolidated_delinquency, 40_000.0);
        assert_eq!(snapshot.gross_portfolio, 800_000.0);
        assert!((snapshot.npl_ratio_pct - 5.0).abs() < 1e-12);
        assert!((snapshot.npl_ratio - 0.05).abs() < 1e-12);
        assert!((snapshot.liquidity_ratio_pct - 5.0).abs() < 1e-12);
        assert!((snapshot.concentration_ratio_pct - 80.0).abs() < 1e-12);

        // Absent elements default to zero.
        assert_eq!(snapshot.federal_bonds, 0.0);
        assert_eq!(snapshot.derivatives_total, 0.0);

        assert_eq!(snapshot.status, ProcessingStatus::Success);
        assert!(snapshot.error_message.is_none());
    }

    #[test]
    fn missing_cnpj_falls_back_to_the_requested_fund() {
        let xml = "<DOC_ARQ><VL_DISPONIB>1,00</VL_DISPONIB></DOC_ARQ>";
        let fund = FundId::new("123456");
        let snapshot = parse(xml.as_bytes(), &fund).unwrap();
        assert_eq!(snapshot.fund_id, fund);
        assert_eq!(snapshot.available_funds, 1.0);
    }

    #[test]
    fn parent_qualified_paths_disambiguate_repeated_leaves() {
        // The same leaf name under two sections must resolve per section.
        let xml = r"<DOC_ARQ>
            <CRED_EXISTE><VL_CRED_EXISTE_INAD>100,00</VL_CRED_EXISTE_INAD></CRED_EXISTE>
            <RESUMO><VL_CRED_EXISTE_INAD>999,00</VL_CRED_EXISTE_INAD></RESUMO>
        </DOC_ARQ>";
        let snapshot = parse(xml.as_bytes(), &FundId::new("1")).unwrap();
        assert_eq!(snapshot.credit_delinquency, 100.0);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let error = parse(b"<DOC_ARQ><open>", &FundId::new("1")).unwrap_err();
        assert!(matches!(error, Error::Parse(_)));
        assert_eq!(error.status(), ProcessingStatus::ParseError);

        let error = parse(b"", &FundId::new("1")).unwrap_err();
        assert!(matches!(error, Error::Parse(_)));
    }

    #[test]
    fn dash_and_empty_values_read_as_zero() {
        let xml = r"<DOC_ARQ>
            <VL_DISPONIB>-</VL_DISPONIB>
            <VL_CARTEIRA></VL_CARTEIRA>
        </DOC_ARQ>";
        let snapshot = parse(xml.as_bytes(), &FundId::new("1")).unwrap();
        assert_eq!(snapshot.available_funds, 0.0);
        assert_eq!(snapshot.total_portfolio, 0.0);
    }
}
