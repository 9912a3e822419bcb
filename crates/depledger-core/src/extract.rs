use std::io::Read as _;

use anyhow::{Context, Result};
use url::Url;

use crate::lockfile::RawDependency;
use crate::model::License;

const LICENSES_OPEN: &str = "<licenses>";
const LICENSES_CLOSE: &str = "</licenses>";
const LICENSE_OPEN: &str = "<license>";
const NAME_OPEN: &str = "<name>";
const URL_OPEN: &str = "<url>";

/// Retrieves a package manifest document as text. Injected so the engine can
/// be driven by a fake in tests; the production impl is [`HttpFetcher`].
pub trait LicenseFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher over http/https, plus `file://` for local mirrors and tests.
pub struct HttpFetcher;

impl LicenseFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).with_context(|| format!("invalid url: {url:?}"))?;
        match parsed.scheme() {
            "file" => {
                let path = parsed.to_file_path().map_err(|_| {
                    anyhow::anyhow!("file url could not be converted to a path: {url:?}")
                })?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))
            }
            "http" | "https" => {
                let resp = ureq::get(url)
                    .call()
                    .map_err(|e| anyhow::anyhow!("http GET {url}: {e}"))?;
                let mut reader = resp.into_body().into_reader();
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).context("read http response")?;
                String::from_utf8(buf).with_context(|| format!("response from {url} is not utf-8"))
            }
            other => anyhow::bail!("unsupported url scheme {other:?} for {url}"),
        }
    }
}

/// Derives the POM URL from an artifact download URL by swapping the file
/// extension for `pom`.
pub fn pom_url(artifact_url: &str) -> Result<String> {
    let file_start = artifact_url.rfind('/').map(|i| i + 1).unwrap_or(0);
    let Some(dot) = artifact_url[file_start..].rfind('.') else {
        anyhow::bail!("cannot derive pom url from artifact url: {artifact_url:?}");
    };
    Ok(format!("{}pom", &artifact_url[..file_start + dot + 1]))
}

/// Tolerant marker scan over a POM document, in declaration order.
///
/// Not an XML parser: the documents are not guaranteed well-formed, and the
/// only requirement is finding the `<licenses>` block markers. No `<licenses>`
/// marker means the package declares no licenses and yields an empty list. A
/// `<license>` element whose name/url never terminates before end of document
/// is a truncated block and fatal.
pub fn scan_license_pairs(doc: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let Some(open) = doc.find(LICENSES_OPEN) else {
        return Ok(pairs);
    };
    let mut cursor = open + LICENSES_OPEN.len();
    while cursor < doc.len() {
        let rest = &doc[cursor..];
        let next_element = rest.find(LICENSE_OPEN);
        let closing = rest.find(LICENSES_CLOSE);
        let at = match (next_element, closing) {
            (Some(e), Some(c)) if e < c => e,
            (Some(e), None) => e,
            _ => break,
        };
        let element_start = cursor + at + LICENSE_OPEN.len();
        let (name, after_name) = capture_tag_text(doc, element_start, NAME_OPEN)?;
        let (url, after_url) = capture_tag_text(doc, after_name, URL_OPEN)?;
        pairs.push((name, url));
        cursor = after_url;
    }
    Ok(pairs)
}

/// Finds `tag` at or after `from` and captures the text up to the next `<`.
/// Both scans are bounded by the document length.
fn capture_tag_text(doc: &str, from: usize, tag: &str) -> Result<(String, usize)> {
    let Some(open) = doc[from..].find(tag) else {
        anyhow::bail!("truncated licenses block: no {tag} before end of document");
    };
    let text_start = from + open + tag.len();
    let Some(end) = doc[text_start..].find('<') else {
        anyhow::bail!("truncated licenses block: unterminated {tag} value");
    };
    Ok((doc[text_start..text_start + end].to_string(), text_start + end))
}

/// Fetches and scans one dependency's POM. A fetch failure is fatal for the
/// whole run; skipping a dependency silently would leave a hole in the
/// manifest.
pub fn extract_licenses(
    fetcher: &dyn LicenseFetcher,
    dep: &RawDependency,
) -> Result<Vec<License>> {
    let url = pom_url(&dep.url)?;
    let doc = fetcher.fetch(&url).map_err(|err| {
        anyhow::anyhow!(
            "unreachable manifest: {url} for dependency {}: {err:#}",
            dep.coord
        )
    })?;
    let pairs = scan_license_pairs(&doc)
        .with_context(|| format!("scan licenses in {url} for dependency {}", dep.coord))?;
    Ok(pairs
        .into_iter()
        .map(|(name, link)| License::from_pom(name, link))
        .collect())
}
