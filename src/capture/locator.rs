use crate::capture::DocumentProbe;
use crate::config::LocatorConfig;
use crate::error::Result;
use std::fmt;

/// One way of finding the dashboard's visual root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// First visible element matching a CSS selector
    Selector(String),
    /// Nearest multi-child, visible ancestor of the first widget element
    WidgetAncestor(String),
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Selector(selector) => write!(f, "selector {}", selector),
            Candidate::WidgetAncestor(selector) => write!(f, "ancestor of {}", selector),
        }
    }
}

/// An element found by the locator, with the candidate that found it
#[derive(Debug, Clone)]
pub struct Located<N> {
    pub node: N,
    pub candidate: Candidate,
}

/// Finds the element that holds the rendered dashboard
#[derive(Debug, Clone)]
pub struct Locator {
    candidates: Vec<Candidate>,
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(&LocatorConfig::default())
    }
}

impl Locator {
    /// Build the candidate list: configured selectors in order, then the widget fallback
    pub fn new(config: &LocatorConfig) -> Self {
        let mut candidates: Vec<Candidate> = config
            .selectors
            .iter()
            .map(|s| Candidate::Selector(s.clone()))
            .collect();
        candidates.push(Candidate::WidgetAncestor(config.widget_selector.clone()));
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Returns the first candidate that yields an element, or `None` when
    /// nothing on the page looks like a dashboard.
    pub async fn locate<P: DocumentProbe>(&self, probe: &P) -> Option<Located<P::Node>> {
        for candidate in &self.candidates {
            match try_candidate(probe, candidate).await {
                Ok(Some(node)) => {
                    ::log::info!("Located dashboard element via {}", candidate);
                    return Some(Located {
                        node,
                        candidate: candidate.clone(),
                    });
                }
                Ok(None) => {
                    ::log::trace!("No visible element for {}", candidate);
                }
                Err(e) => {
                    ::log::warn!("Skipping {} after probe error: {}", candidate, e);
                }
            }
        }

        ::log::info!("No dashboard element found on the page");
        None
    }
}

async fn try_candidate<P: DocumentProbe>(probe: &P, candidate: &Candidate) -> Result<Option<P::Node>> {
    match candidate {
        Candidate::Selector(selector) => first_visible(probe, selector).await,
        Candidate::WidgetAncestor(selector) => widget_ancestor(probe, selector).await,
    }
}

async fn first_visible<P: DocumentProbe>(probe: &P, selector: &str) -> Result<Option<P::Node>> {
    for node in probe.query_all(selector).await? {
        if probe.rect(&node).await?.is_visible() {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

async fn widget_ancestor<P: DocumentProbe>(probe: &P, selector: &str) -> Result<Option<P::Node>> {
    let Some(widget) = probe.query_all(selector).await?.into_iter().next() else {
        return Ok(None);
    };

    let mut current = probe.parent(&widget).await?;
    while let Some(node) = current {
        let tag = probe.tag_name(&node).await?;
        if tag == "body" || tag == "html" {
            break;
        }
        if probe.child_count(&node).await? > 1 && probe.rect(&node).await?.height > 0.0 {
            return Ok(Some(node));
        }
        current = probe.parent(&node).await?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::html::StaticPage;

    fn page(html: &str) -> StaticPage {
        StaticPage::parse(html)
    }

    #[tokio::test]
    async fn test_first_selector_in_list_order_wins() {
        let page = page(
            r#"<html><body>
                <div class="hub-content" style="width: 800px; height: 600px"></div>
                <div class="dashboard-grid" id="grid" style="width: 700px; height: 500px"></div>
            </body></html>"#,
        );
        let found = Locator::default().locate(&page.probe()).await.unwrap();
        assert_eq!(found.candidate, Candidate::Selector(".dashboard-grid".to_string()));
        assert_eq!(found.node.value().attr("id"), Some("grid"));
    }

    #[tokio::test]
    async fn test_zero_area_match_is_skipped() {
        let page = page(
            r#"<html><body>
                <div class="dashboard-container" style="width: 800px; height: 0px"></div>
                <div class="dashboard-container" style="display: none"></div>
                <main role="main" id="main" style="width: 900px; height: 400px"></main>
            </body></html>"#,
        );
        let found = Locator::default().locate(&page.probe()).await.unwrap();
        assert_eq!(found.node.value().attr("id"), Some("main"));
    }

    #[tokio::test]
    async fn test_later_visible_match_of_same_selector() {
        let page = page(
            r#"<html><body>
                <div class="dashboard-container" id="a" hidden style="width: 10px; height: 10px"></div>
                <div class="dashboard-container" id="b" style="width: 10px; height: 10px"></div>
            </body></html>"#,
        );
        let found = Locator::default().locate(&page.probe()).await.unwrap();
        assert_eq!(found.node.value().attr("id"), Some("b"));
    }

    #[tokio::test]
    async fn test_widget_ancestor_fallback() {
        let page = page(
            r#"<html><body>
                <section id="board">
                    <div class="tile">
                        <div class="widget-host" style="width: 200px; height: 150px"></div>
                    </div>
                    <div class="tile" style="width: 200px; height: 150px"></div>
                </section>
            </body></html>"#,
        );
        let found = Locator::default().locate(&page.probe()).await.unwrap();
        assert!(matches!(found.candidate, Candidate::WidgetAncestor(_)));
        assert_eq!(found.node.value().attr("id"), Some("board"));
    }

    #[tokio::test]
    async fn test_fallback_never_returns_body() {
        let page = page(
            r#"<html><body>
                <div class="widget-host" style="width: 200px; height: 150px"></div>
                <p>text</p>
            </body></html>"#,
        );
        assert!(Locator::default().locate(&page.probe()).await.is_none());
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let page = page("<html><body><p>No dashboard here</p></body></html>");
        assert!(Locator::default().locate(&page.probe()).await.is_none());
    }

    #[tokio::test]
    async fn test_custom_selector_list() {
        let config = LocatorConfig {
            selectors: vec!["#custom".to_string()],
            widget_selector: ".never".to_string(),
        };
        let page = page(
            r#"<html><body>
                <div class="dashboard-container" style="width: 10px; height: 10px"></div>
                <div id="custom" style="width: 10px; height: 10px"></div>
            </body></html>"#,
        );
        let locator = Locator::new(&config);
        assert_eq!(locator.candidates().len(), 2);
        let found = locator.locate(&page.probe()).await.unwrap();
        assert_eq!(found.node.value().attr("id"), Some("custom"));
    }

    #[tokio::test]
    async fn test_invalid_selector_is_skipped() {
        let config = LocatorConfig {
            selectors: vec!["[[bad".to_string(), ".dashboard-grid".to_string()],
            widget_selector: "[class*=\"widget\"]".to_string(),
        };
        let page = page(
            r#"<html><body><div class="dashboard-grid" style="width: 5px; height: 5px"></div></body></html>"#,
        );
        let found = Locator::new(&config).locate(&page.probe()).await.unwrap();
        assert_eq!(found.candidate, Candidate::Selector(".dashboard-grid".to_string()));
    }
}
