use crate::sheet::PayloadFormat;
use anyhow::{bail, Context, Result};
use url::Url;

/// `{base}/{spreadsheet_id}/gviz/tq?tqx=out:json&gid={gid}`
pub fn dataset_url(base: &Url, spreadsheet_id: &str, gid: &str, format: PayloadFormat) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .push(spreadsheet_id)
            .push("gviz")
            .push("tq");
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("tqx", format.tqx())
        .append_pair("gid", gid);
    url
}

/// Parse and check the configured base URL.
pub fn parse_base(base: &str) -> Result<Url> {
    let url = Url::parse(base).with_context(|| format!("parsing base URL {}", base))?;
    if url.cannot_be_a_base() {
        bail!("{} cannot be used as a base URL", base);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_gviz_urls() {
        let base = parse_base("https://docs.google.com/spreadsheets/d").unwrap();
        let url = dataset_url(&base, "SHEET", "1133040566", PayloadFormat::Json);
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/SHEET/gviz/tq?tqx=out%3Ajson&gid=1133040566"
        );
    }

    #[test]
    fn trailing_slash_and_csv() {
        let base = parse_base("http://127.0.0.1:8080/d/").unwrap();
        let url = dataset_url(&base, "id", "0", PayloadFormat::Csv);
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/d/id/gviz/tq?tqx=out%3Acsv&gid=0");
    }

    #[test]
    fn rejects_non_base() {
        assert!(parse_base("mailto:someone@example.com").is_err());
        assert!(parse_base("not a url").is_err());
    }
}
