//! Dataset and catalog retrieval: URL construction, gzip decoding

use crate::error::{EstatError, EstatResult, TransportError};
use crate::fetch::transport::{HttpTransport, Transport};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// SDMX 2.1 dissemination endpoint (path-style identifiers)
pub const SDMX_BASE_URL: &str = "https://ec.europa.eu/eurostat/api/dissemination/sdmx/2.1/data";

/// Bulk download listing (query-parameter identifiers)
pub const BULK_BASE_URL: &str =
    "https://ec.europa.eu/eurostat/estat-navtree-portlet-prod/BulkDownloadListing";

/// Table of contents, tab-separated
pub const CATALOG_URL: &str =
    "https://ec.europa.eu/eurostat/api/dissemination/catalogue/toc/txt?lang=en";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How the dataset identifier is joined onto the base endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStyle {
    /// `{base}/{id}?format=TSV&compressed=true`
    #[default]
    Sdmx,
    /// `{base}?sort=1&file=data%2F{id}.tsv.gz`
    Bulk,
}

/// Build the retrieval URL for a dataset identifier.
pub fn dataset_url(base_url: &str, style: UrlStyle, indicator: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match style {
        UrlStyle::Sdmx => format!("{}/{}?format=TSV&compressed=true", base, indicator),
        UrlStyle::Bulk => format!("{}?sort=1&file=data%2F{}.tsv.gz", base, indicator),
    }
}

/// Retrieves dataset and catalog text over a [`Transport`]
#[derive(Debug, Clone)]
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    base_url: String,
    url_style: UrlStyle,
    catalog_url: String,
}

impl Fetcher<HttpTransport> {
    /// Fetcher against the public SDMX endpoint
    pub fn http() -> EstatResult<Self> {
        let transport = HttpTransport::new().map_err(EstatError::ClientError)?;
        Ok(Self::new(transport))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: SDMX_BASE_URL.to_string(),
            url_style: UrlStyle::Sdmx,
            catalog_url: CATALOG_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>, style: UrlStyle) -> Self {
        self.base_url = base_url.into();
        self.url_style = style;
        self
    }

    pub fn with_catalog_url(mut self, catalog_url: impl Into<String>) -> Self {
        self.catalog_url = catalog_url.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn url_for(&self, indicator: &str) -> String {
        dataset_url(&self.base_url, self.url_style, indicator)
    }

    /// Download one dataset and return its decompressed TSV text.
    pub fn fetch_dataset(&self, indicator: &str) -> EstatResult<String> {
        let url = self.url_for(indicator);
        log::debug!("Fetching dataset {} from {}", indicator, url);
        self.fetch_text(url)
    }

    /// Download the table of contents listing.
    pub fn fetch_catalog(&self) -> EstatResult<String> {
        log::debug!("Fetching catalog from {}", self.catalog_url);
        self.fetch_text(self.catalog_url.clone())
    }

    fn fetch_text(&self, url: String) -> EstatResult<String> {
        match self.transport.get(&url).and_then(|bytes| decode_payload(&bytes)) {
            Ok(text) => Ok(text),
            Err(source) => Err(EstatError::Fetch { url, source }),
        }
    }
}

/// Gunzip the payload when it carries the gzip magic, then decode as UTF-8.
pub fn decode_payload(bytes: &[u8]) -> Result<String, TransportError> {
    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(TransportError::Decompress)?;
        out
    } else {
        bytes.to_vec()
    };

    String::from_utf8(raw).map_err(|_| TransportError::Encoding)
}
