use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::formats::RawCandidate;

const LD_JSON_CONTENT_TYPE: &str = "application/ld+json";

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));
static TITLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/title/(tt\d+)").expect("valid title id regex"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document has no application/ld+json blocks; not a chart page")]
    NoStructuredData,

    #[error("none of the {blocks} application/ld+json blocks could be decoded")]
    Undecodable { blocks: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankHints(HashMap<String, u32>);

impl RankHints {
    /// Assigns each distinct title id the 1-based position of its first href.
    pub fn from_hrefs<'a>(hrefs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ranks = HashMap::new();
        for href in hrefs {
            let Some(id) = title_id(href) else {
                continue;
            };
            let next = ranks.len() as u32 + 1;
            ranks.entry(id).or_insert(next);
        }
        Self(ranks)
    }

    pub fn get(&self, title_id: &str) -> Option<u32> {
        self.0.get(title_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u32)> for RankHints {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub candidates: Vec<RawCandidate>,
    pub rank_hints: RankHints,
    pub blocks_found: usize,
    pub blocks_decoded: usize,
}

pub fn title_id(url: &str) -> Option<String> {
    TITLE_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

pub fn parse(document: &str) -> Result<ParsedDocument, ParseError> {
    let html = Html::parse_document(document);

    let mut parsed = ParsedDocument::default();
    for script in html.select(&SCRIPT_SELECTOR) {
        let is_ld_json = script
            .value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(LD_JSON_CONTENT_TYPE));
        if !is_ld_json {
            continue;
        }
        parsed.blocks_found += 1;

        let body = script.text().collect::<String>();
        let value = match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    block = parsed.blocks_found,
                    %err,
                    "skipping undecodable ld+json block"
                );
                continue;
            }
        };
        parsed.blocks_decoded += 1;
        expand_block(value, &mut parsed.candidates);
    }

    if parsed.blocks_decoded == 0 {
        return Err(match parsed.blocks_found {
            0 => ParseError::NoStructuredData,
            blocks => ParseError::Undecodable { blocks },
        });
    }

    parsed.rank_hints = RankHints::from_hrefs(
        html.select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href")),
    );

    tracing::debug!(
        blocks = parsed.blocks_found,
        decoded = parsed.blocks_decoded,
        candidates = parsed.candidates.len(),
        rank_hints = parsed.rank_hints.len(),
        "parsed chart document"
    );
    Ok(parsed)
}

fn expand_block(value: Value, out: &mut Vec<RawCandidate>) {
    match value {
        Value::Array(items) => {
            for item in items {
                expand_block(item, out);
            }
        }
        Value::Object(mut object) => {
            if matches!(object.get("@graph"), Some(Value::Array(_) | Value::Object(_)))
                && let Some(graph) = object.remove("@graph")
            {
                expand_block(graph, out);
                return;
            }

            let is_item_list = object.get("@type").and_then(Value::as_str) == Some("ItemList");
            if is_item_list
                && matches!(object.get("itemListElement"), Some(Value::Array(_)))
                && let Some(Value::Array(elements)) = object.remove("itemListElement")
            {
                for element in elements {
                    let Value::Object(mut element) = element else {
                        continue;
                    };
                    match element.remove("item") {
                        Some(Value::Object(item)) => out.push(item.into()),
                        _ => out.push(element.into()),
                    }
                }
                return;
            }

            out.push(object.into());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(scripts: &[&str], body: &str) -> String {
        let mut head = String::new();
        for script in scripts {
            head.push_str(&format!(
                "<script type=\"application/ld+json\">{script}</script>\n"
            ));
        }
        format!("<!doctype html><html><head>{head}</head><body>{body}</body></html>")
    }

    #[test]
    fn title_id_reads_path_token() {
        assert_eq!(
            title_id("https://www.imdb.com/title/tt0111161/?ref_=chttp_t_1").as_deref(),
            Some("tt0111161")
        );
        assert_eq!(title_id("/title/tt0068646/").as_deref(), Some("tt0068646"));
        assert_eq!(title_id("/name/nm0000209/"), None);
    }

    #[test]
    fn rank_hints_keep_first_appearance() {
        let hints = RankHints::from_hrefs([
            "/title/tt2/?ref_=chttp_t_1",
            "/title/tt2/?ref_=chttp_i_1",
            "/chart/top/",
            "/title/tt1/",
            "/title/tt3/",
            "/title/tt1/",
        ]);
        assert_eq!(hints.len(), 3);
        assert_eq!(hints.get("tt2"), Some(1));
        assert_eq!(hints.get("tt1"), Some(2));
        assert_eq!(hints.get("tt3"), Some(3));
    }

    #[test]
    fn item_list_elements_become_candidates() {
        let html = page(
            &[r#"{"@type":"ItemList","itemListElement":[
                {"@type":"ListItem","item":{"url":"/title/tt1/","name":"One"}},
                {"@type":"ListItem","item":{"url":"/title/tt2/","name":"Two"}}
            ]}"#],
            r#"<a href="/title/tt2/">Two</a><a href="/title/tt1/">One</a>"#,
        );

        let parsed = parse(&html).unwrap();
        assert_eq!(parsed.blocks_found, 1);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[0].get_str("name"), Some("One"));
        assert_eq!(parsed.rank_hints.get("tt2"), Some(1));
        assert_eq!(parsed.rank_hints.get("tt1"), Some(2));
    }

    #[test]
    fn list_blocks_yield_one_candidate_per_element() {
        let html = page(
            &[
                r#"[{"name":"A","url":"/title/tt1/"},{"name":"B","url":"/title/tt2/"}]"#,
                r#"{"@type":"Movie","name":"C","url":"/title/tt3/"}"#,
            ],
            "",
        );

        let parsed = parse(&html).unwrap();
        let names: Vec<_> = parsed
            .candidates
            .iter()
            .filter_map(|c| c.get_str("name"))
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(parsed.rank_hints.is_empty());
    }

    #[test]
    fn graph_nodes_are_expanded() {
        let html = page(
            &[r#"{"@context":"https://schema.org","@graph":[{"@type":"WebSite"},{"@type":"Movie","name":"G"}]}"#],
            "",
        );
        let parsed = parse(&html).unwrap();
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.candidates[1].get_str("name"), Some("G"));
    }

    #[test]
    fn single_object_graph_is_expanded_and_scalar_graph_is_kept() {
        let html = page(
            &[
                r#"{"@graph":{"@type":"Movie","name":"Solo","url":"/title/tt1/"}}"#,
                r#"{"@graph":"n/a","name":"Kept","url":"/title/tt2/"}"#,
                r#"{"@type":"ItemList","itemListElement":"none","name":"List"}"#,
            ],
            "",
        );
        let parsed = parse(&html).unwrap();
        assert_eq!(parsed.candidates.len(), 3);
        assert_eq!(parsed.candidates[0].get_str("name"), Some("Solo"));
        assert_eq!(parsed.candidates[1].get_str("name"), Some("Kept"));
        assert_eq!(parsed.candidates[1].get_str("@graph"), Some("n/a"));
        assert_eq!(parsed.candidates[2].get_str("itemListElement"), Some("none"));
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let html = page(&["{ not json", r#"{"name":"ok"}"#], "");
        let parsed = parse(&html).unwrap();
        assert_eq!(parsed.blocks_found, 2);
        assert_eq!(parsed.blocks_decoded, 1);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn content_type_match_ignores_case_and_whitespace() {
        let html = r#"<html><head><script type=" Application/LD+JSON ">{"name":"x"}</script>
<script type="text/javascript">{"name":"ignored"}</script></head></html>"#;
        let parsed = parse(html).unwrap();
        assert_eq!(parsed.blocks_found, 1);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn document_without_blocks_is_rejected_even_with_anchors() {
        let html = page(&[], r#"<a href="/title/tt1/">One</a>"#);
        assert_eq!(parse(&html).unwrap_err(), ParseError::NoStructuredData);
    }

    #[test]
    fn document_with_only_malformed_blocks_is_rejected() {
        let html = page(&["{", "[1,"], "");
        assert_eq!(
            parse(&html).unwrap_err(),
            ParseError::Undecodable { blocks: 2 }
        );
    }
}
