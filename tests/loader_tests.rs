use frc_loader::core::FilingMetadata;
use frc_loader::{
    BatchRunner, BatchSummary, CsvSink, FilerDriver, FilingExtract, JsonModelProvider, LoaderConfig,
    LocalArtifactStore, Register, TableSink,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const IFRS_NS: &str = "https://xbrl.ifrs.org/taxonomy/2022-03-24/ifrs-full";
const EXT_NS: &str = "http://www.acme.co.uk/2022-12-31";

const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- Document created by Acme Tagger 3.1 -->
<html xmlns="http://www.w3.org/1999/xhtml"
      xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:ifrs-full="https://xbrl.ifrs.org/taxonomy/2022-03-24/ifrs-full">
  <body>
    <div style="display:none">
      <ix:header>
        <ix:hidden>
          <ix:nonNumeric name="ifrs-full:NameOfReportingEntity" contextRef="fy">Acme plc</ix:nonNumeric>
        </ix:hidden>
      </ix:header>
    </div>
    <p>Revenue <ix:nonFraction name="ifrs-full:Revenue" contextRef="fy" unitRef="GBP" decimals="-3">1,000</ix:nonFraction></p>
    <p style="color: red; display: none">
      <ix:nonFraction name="ifrs-full:Revenue" contextRef="fy_retail" unitRef="GBP" decimals="-3">400</ix:nonFraction>
    </p>
  </body>
</html>
"#;

fn qname(namespace: &str, prefix: &str, local_name: &str) -> Value {
    json!({ "namespace": namespace, "prefix": prefix, "local_name": local_name })
}

fn ifrs(local_name: &str) -> Value {
    qname(IFRS_NS, "ifrs-full", local_name)
}

fn gbp() -> Value {
    json!({ "measures": [qname("http://www.xbrl.org/2003/iso4217", "iso4217", "GBP")] })
}

fn model() -> Value {
    let fy = json!({ "type": "duration", "start": "2022-01-01", "end": "2022-12-31" });
    json!({
        "namespace_docs": [EXT_NS],
        "namespaces": [
            { "prefix": "ifrs-full", "uri": IFRS_NS },
            { "prefix": "acme", "uri": EXT_NS }
        ],
        "concepts": [
            { "qname": ifrs("Revenue"), "is_numeric": true, "is_monetary": true, "period_type": "duration" },
            { "qname": ifrs("NameOfReportingEntity"), "period_type": "duration" },
            { "qname": ifrs("SegmentsAxis"), "is_abstract": true },
            { "qname": qname(EXT_NS, "acme", "RetailMember"), "is_abstract": true }
        ],
        "contexts": [
            { "id": "fy", "period": fy },
            {
                "id": "fy_retail",
                "period": fy,
                "dimensions": [
                    { "dimension": ifrs("SegmentsAxis"), "member": qname(EXT_NS, "acme", "RetailMember") }
                ]
            }
        ],
        "facts": [
            { "qname": ifrs("Revenue"), "context_ref": "fy", "value": "1000", "decimals": "-3", "unit": gbp() },
            { "qname": ifrs("Revenue"), "context_ref": "fy_retail", "value": "400", "decimals": "-3", "unit": gbp() },
            { "qname": ifrs("NameOfReportingEntity"), "context_ref": "fy", "value": "Acme plc" }
        ]
    })
}

/// Lay out one filing under the cache the way the index urls point at it.
fn seed_filing(cache: &Path, filer: &str) {
    let reports = cache.join(filer).join("2022").join("reports");
    fs::create_dir_all(&reports).unwrap();
    fs::write(reports.join(format!("{}-2022.xhtml", filer)), REPORT).unwrap();
    fs::write(
        reports.join(format!("{}-2022.json", filer)),
        serde_json::to_string(&model()).unwrap(),
    )
    .unwrap();
    fs::write(cache.join(filer).join("2022").join(format!("{}-2022.zip", filer)), [0u8; 64]).unwrap();
}

fn meta(filer: &str, country: &str) -> FilingMetadata {
    serde_json::from_value(json!({
        "report_url": format!("/{0}/2022/reports/{0}-2022.xhtml", filer),
        "package_url": format!("/{0}/2022/{0}-2022.zip", filer),
        "period_end": "2022-12-31",
        "country": country
    }))
    .unwrap()
}

fn driver(cache: &Path, exclude: &[&str]) -> FilerDriver {
    let config = LoaderConfig {
        cache_dir: cache.to_path_buf(),
        exclude_countries: exclude.iter().map(|c| c.to_string()).collect(),
        ..LoaderConfig::default()
    };
    FilerDriver::new(
        Register::EsefFca,
        config,
        Arc::new(JsonModelProvider),
        Arc::new(LocalArtifactStore::new(cache)),
    )
}

#[test]
fn test_filing_index_to_tables() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    seed_filing(&cache, "acme");
    seed_filing(&cache, "bolt");

    // bolt is excluded by country, ghost has nothing on disk
    let index = vec![meta("acme", "GB"), meta("bolt", "de"), meta("ghost", "GB")];
    let driver = driver(&cache, &["DE"]);
    assert_eq!(driver.accepted(&index).len(), 2);

    let extracts = driver.process_all(&index);
    assert_eq!(extracts.len(), 1);
    let extract = &extracts[0];
    assert_eq!(extract.filing_id, "ESEF_FCAacme-2022");

    let mut sink = CsvSink::new(dir.path().join("out")).unwrap();
    sink.write_filing(extract).unwrap();
    let out = sink.output_dir();

    let facts = fs::read_to_string(out.join("facts.csv")).unwrap();
    let facts: Vec<&str> = facts.lines().collect();
    assert_eq!(facts.len(), 4);
    assert_eq!(
        facts[1],
        "ESEF_FCAacme-2022,ifrs-full,Revenue,,1000,-3,GBP,2022-12-31,2022-01-01,"
    );
    assert_eq!(
        facts[2],
        "ESEF_FCAacme-2022,ifrs-full,Revenue,,400,-3,GBP,2022-12-31,2022-01-01,C-1"
    );
    assert_eq!(
        facts[3],
        "ESEF_FCAacme-2022,ifrs-full,NameOfReportingEntity,Acme plc,,,,2022-12-31,2022-01-01,"
    );

    let dims = fs::read_to_string(out.join("dims.csv")).unwrap();
    assert!(dims.contains("ESEF_FCAacme-2022,c-1,ifrs-full,SegmentsAxis,acme,RetailMember"));
    let unique = fs::read_to_string(out.join("unique_dims.csv")).unwrap();
    assert!(unique.contains("ESEF_FCAacme-2022,C-1,ifrs-full,SegmentsAxis,acme,RetailMember"));

    let concepts = fs::read_to_string(out.join("concepts.csv")).unwrap();
    assert_eq!(concepts.lines().count(), 5);
    assert!(concepts.lines().any(|l| l.starts_with("acme,RetailMember,") && l.ends_with(",2022-12-31")));
    assert!(concepts.lines().any(|l| l.starts_with("ifrs-full,Revenue,") && l.ends_with(",2022-03-24")));

    let namespaces = fs::read_to_string(out.join("namespaces.csv")).unwrap();
    assert_eq!(namespaces.lines().count(), 3);

    // No relationships in the model, so no anchors file at all
    assert!(!out.join("anchors.csv").exists());

    let extra = fs::read_to_string(out.join("filings_extra_detail.csv")).unwrap();
    let extra: Vec<&str> = extra.lines().collect();
    assert_eq!(extra[0], "filing_id,vendor,package_size,concealed_facts,hidden_facts");
    assert_eq!(extra[1], "ESEF_FCAacme-2022,Acme Tagger 3.1,64,1,1");

    let bundle: Value =
        serde_json::from_str(&fs::read_to_string(sink.json_path(&extract.filing_id)).unwrap()).unwrap();
    assert_eq!(bundle["analytics"]["currencies"]["primary"], "GBP");
    assert_eq!(bundle["analytics"]["annual_period"]["end"], "2022-12-31");
    assert!(bundle.get("tables").is_none());
}

#[test]
fn test_broken_model_skips_only_that_filing() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    seed_filing(&cache, "acme");
    seed_filing(&cache, "bolt");
    fs::write(cache.join("bolt/2022/reports/bolt-2022.json"), "{ not json").unwrap();

    let index = vec![meta("bolt", "GB"), meta("acme", "GB")];
    let extracts = driver(&cache, &[]).process_all(&index);

    assert_eq!(extracts.len(), 1);
    assert_eq!(extracts[0].filing_id, "ESEF_FCAacme-2022");
}

#[tokio::test]
async fn test_parallel_matches_sequential_order() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    let filers = ["acme", "bolt", "crux"];
    for filer in filers {
        seed_filing(&cache, filer);
    }

    let index: Vec<FilingMetadata> = filers.iter().map(|f| meta(f, "GB")).collect();
    let driver = driver(&cache, &[]);

    let sequential: Vec<String> = driver
        .process_all(&index)
        .into_iter()
        .map(|e| e.filing_id)
        .collect();
    let parallel: Vec<String> = driver
        .process_parallel(&index)
        .await
        .into_iter()
        .map(|e| e.filing_id)
        .collect();

    assert_eq!(parallel, sequential);
    assert_eq!(
        parallel,
        vec!["ESEF_FCAacme-2022", "ESEF_FCAbolt-2022", "ESEF_FCAcrux-2022"]
    );
}

/// Rejects one named filing and records everything else.
struct PickySink {
    reject: String,
    written: Vec<String>,
}

impl TableSink for PickySink {
    fn write_filing(&mut self, extract: &FilingExtract) -> anyhow::Result<()> {
        if extract.filing_id == self.reject {
            anyhow::bail!("disk full");
        }
        self.written.push(extract.filing_id.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_unusable_index_does_not_stop_later_filers() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    seed_filing(&cache, "acme");
    seed_filing(&cache, "bolt");

    let malformed = dir.path().join("malformed.json");
    fs::write(&malformed, r#"[{"period_end": "end of year"}]"#).unwrap();
    let good = dir.path().join("good.json");
    fs::write(
        &good,
        serde_json::to_string(&vec![meta("acme", "GB"), meta("bolt", "GB")]).unwrap(),
    )
    .unwrap();
    let indexes = vec![dir.path().join("missing.json"), malformed, good];

    let driver = driver(&cache, &[]);
    let mut sink = PickySink {
        reject: "ESEF_FCAacme-2022".to_string(),
        written: Vec::new(),
    };
    let summary = BatchRunner::new(&driver, &mut sink).run(&indexes).await;

    assert_eq!(
        summary,
        BatchSummary {
            written: 1,
            skipped: 1,
            failed_indexes: 2,
        }
    );
    assert_eq!(sink.written, vec!["ESEF_FCAbolt-2022"]);
}
