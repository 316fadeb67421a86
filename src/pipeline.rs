use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::fetch::DocumentFetcher;
use crate::model::{PageRef, SpeciesRecord};
use crate::output::RecordSink;
use crate::parser::{links, species, ParsedDocument, Selectors};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Stop after this many letter pages.
    pub limit: Option<usize>,
    /// Resolve each `detail_url` against the page it was found on.
    pub absolute_urls: bool,
    pub progress: bool,
}

impl From<&ScrapeConfig> for PipelineOptions {
    fn from(cfg: &ScrapeConfig) -> Self {
        Self {
            limit: cfg.limit,
            absolute_urls: cfg.absolute_urls,
            progress: false,
        }
    }
}

/// Run stats returned after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub pages: usize,
    pub records: usize,
}

/// Index page → letter pages → species records, one request at a time.
pub struct Pipeline<F> {
    fetcher: F,
    selectors: Selectors,
    options: PipelineOptions,
}

impl<F: DocumentFetcher> Pipeline<F> {
    pub fn new(fetcher: F, selectors: Selectors, options: PipelineOptions) -> Self {
        Self {
            fetcher,
            selectors,
            options,
        }
    }

    pub fn from_config(fetcher: F, config: &ScrapeConfig) -> Result<Self> {
        let selectors = Selectors::compile(config)?;
        Ok(Self::new(fetcher, selectors, PipelineOptions::from(config)))
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.options.progress = progress;
        self
    }

    /// Letter-page URLs from the root index, in document order.
    pub async fn letter_pages(&self, base: &Url) -> Result<Vec<Url>> {
        let body = self.fetcher.fetch(base).await?;
        let refs = {
            let doc = ParsedDocument::parse(&body);
            links::discover(&doc, &self.selectors.letter_links)
        };
        if refs.is_empty() {
            warn!("No letter links found on {}", base);
        }

        let mut urls = refs
            .iter()
            .map(|r| r.join(base))
            .collect::<Result<Vec<_>>>()?;
        if let Some(n) = self.options.limit {
            urls.truncate(n);
        }
        info!("Letter pages to scrape: {}", urls.len());
        Ok(urls)
    }

    /// Every species record on one letter page.
    pub async fn scrape_page(&self, url: &Url) -> Result<Vec<SpeciesRecord>> {
        let body = self.fetcher.fetch(url).await?;
        let doc = ParsedDocument::parse(&body);
        let records = species::extract(&doc, &self.selectors.species_items);

        if !self.options.absolute_urls {
            return Ok(records.collect());
        }
        records
            .map(|mut rec| -> Result<SpeciesRecord> {
                rec.detail_url = PageRef::from(rec.detail_url.join(url)?);
                Ok(rec)
            })
            .collect()
    }

    /// Full run, streaming each page's records into `sink` in page order.
    /// The first error aborts; `sink` is only finished on success.
    pub async fn run_into(&self, base: &Url, sink: &mut dyn RecordSink) -> Result<RunStats> {
        let pages = self.letter_pages(base).await?;

        let pb = if self.options.progress {
            let pb = ProgressBar::new(pages.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                    .map_err(std::io::Error::other)?
                    .progress_chars("=> "),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut records = 0usize;
        for url in &pages {
            pb.set_message(url.path().trim_start_matches('/').to_string());
            let page_records = self.scrape_page(url).await?;
            info!("{}: {} records", url, page_records.len());

            for rec in &page_records {
                sink.write_record(rec)?;
            }
            sink.flush()?;
            records += page_records.len();
            pb.inc(1);
        }

        sink.finish()?;
        pb.finish_and_clear();
        info!("Scraped {} pages ({} records)", pages.len(), records);

        Ok(RunStats {
            pages: pages.len(),
            records,
        })
    }

    /// Full run, collected.
    pub async fn run(&self, base: &Url) -> Result<Vec<SpeciesRecord>> {
        let mut all = Vec::new();
        self.run_into(base, &mut all).await?;
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::error::ScrapeError;

    const BASE: &str = "https://arb.test/taxalist.aspx";

    /// Serves canned bodies and records the order of requests.
    #[derive(Default)]
    struct StubFetcher {
        pages: HashMap<String, String>,
        log: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        fn page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }
    }

    impl DocumentFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            self.log.borrow_mut().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn index(letters: &[&str]) -> String {
        let anchors: String = letters
            .iter()
            .map(|l| format!(r#"<a href="taxalist-{0}.aspx">{0}</a>"#, l))
            .collect();
        format!(r#"<div class="alphabet">{}</div>"#, anchors)
    }

    fn letter(prefix: &str, n: usize) -> String {
        let items: String = (0..n)
            .map(|i| {
                format!(
                    r#"<li><span><a href="taxon-{0}{1}.aspx"><b>{0} species {1}</b></a></span></li>"#,
                    prefix, i
                )
            })
            .collect();
        format!(r#"<div class="taxalist"><ul>{}</ul></div>"#, items)
    }

    fn stub_site() -> StubFetcher {
        StubFetcher::default()
            .page(BASE, index(&["A", "B", "C"]))
            .page("https://arb.test/taxalist-A.aspx", letter("A", 3))
            .page("https://arb.test/taxalist-B.aspx", letter("B", 0))
            .page("https://arb.test/taxalist-C.aspx", letter("C", 5))
    }

    fn pipeline(fetcher: StubFetcher, options: PipelineOptions) -> Pipeline<StubFetcher> {
        Pipeline::new(fetcher, Selectors::site_defaults(), options)
    }

    #[tokio::test]
    async fn three_pages_in_order() {
        let p = pipeline(stub_site(), PipelineOptions::default());
        let base = Url::parse(BASE).unwrap();
        let recs = p.run(&base).await.unwrap();

        assert_eq!(recs.len(), 8);
        let names: Vec<&str> = recs.iter().map(|r| r.latin_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "A species 0", "A species 1", "A species 2",
                "C species 0", "C species 1", "C species 2", "C species 3", "C species 4",
            ]
        );
        assert_eq!(recs[0].detail_url.as_str(), "taxon-A0.aspx");

        assert_eq!(
            *p.fetcher.log.borrow(),
            vec![
                BASE.to_string(),
                "https://arb.test/taxalist-A.aspx".to_string(),
                "https://arb.test/taxalist-B.aspx".to_string(),
                "https://arb.test/taxalist-C.aspx".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn stats_count_pages_and_records() {
        let p = pipeline(stub_site(), PipelineOptions::default());
        let mut sink = Vec::new();
        let stats = p.run_into(&Url::parse(BASE).unwrap(), &mut sink).await.unwrap();
        assert_eq!(stats, RunStats { pages: 3, records: 8 });
        assert_eq!(sink.len(), 8);
    }

    #[tokio::test]
    async fn limit_truncates_letters() {
        let opts = PipelineOptions {
            limit: Some(1),
            ..Default::default()
        };
        let p = pipeline(stub_site(), opts);
        let recs = p.run(&Url::parse(BASE).unwrap()).await.unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(p.fetcher.log.borrow().len(), 2);
    }

    #[tokio::test]
    async fn absolute_detail_urls() {
        let opts = PipelineOptions {
            absolute_urls: true,
            ..Default::default()
        };
        let p = pipeline(stub_site(), opts);
        let page = Url::parse("https://arb.test/taxalist-A.aspx").unwrap();
        let recs = p.scrape_page(&page).await.unwrap();
        assert_eq!(recs[1].detail_url.as_str(), "https://arb.test/taxon-A1.aspx");
    }

    #[tokio::test]
    async fn missing_page_aborts_run() {
        let fetcher = StubFetcher::default()
            .page(BASE, index(&["A", "B", "C"]))
            .page("https://arb.test/taxalist-A.aspx", letter("A", 2));
        let p = pipeline(fetcher, PipelineOptions::default());

        let mut sink = Vec::new();
        let err = p
            .run_into(&Url::parse(BASE).unwrap(), &mut sink)
            .await
            .unwrap_err();
        match err {
            ScrapeError::Status { url, status } => {
                assert_eq!(url, "https://arb.test/taxalist-B.aspx");
                assert_eq!(status, 404);
            }
            other => panic!("expected Status, got {:?}", other),
        }
        // Page A was streamed before the abort; page C never requested.
        assert_eq!(sink.len(), 2);
        assert_eq!(p.fetcher.log.borrow().len(), 3);
    }

    #[tokio::test]
    async fn no_container_means_no_pages() {
        let fetcher = StubFetcher::default().page(BASE, "<html><body>Maintenance</body></html>");
        let p = pipeline(fetcher, PipelineOptions::default());
        let mut sink = Vec::new();
        let stats = p.run_into(&Url::parse(BASE).unwrap(), &mut sink).await.unwrap();
        assert_eq!(stats, RunStats { pages: 0, records: 0 });
    }
}
