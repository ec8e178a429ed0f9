use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

pub const SITE_BASE: &str = "https://www.imdb.com";

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid duration regex")
});
static BARE_MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*(?:m|min|mins|minutes)?$").expect("valid minutes regex")
});

pub fn text(value: &Value) -> Option<String> {
    let raw = value.as_str()?;
    let decoded = decode_entities(raw.trim());
    let decoded = decoded.trim();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.to_owned())
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

pub fn absolute_url(value: &Value) -> Option<Url> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    let base = Url::parse(SITE_BASE).ok()?;
    let mut url = base.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

pub fn canonical_title_url(value: &Value) -> Option<Url> {
    let mut url = absolute_url(value)?;
    url.set_query(None);
    Some(url)
}

pub fn image_url(value: &Value) -> Option<String> {
    let url = match value {
        Value::Object(object) => absolute_url(object.get("url")?)?,
        other => absolute_url(other)?,
    };
    Some(url.to_string())
}

pub fn rating_value(aggregate: &Value) -> Option<f64> {
    let value = match aggregate.as_object()?.get("ratingValue")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && (0.0..=10.0).contains(&value)).then_some(value)
}

pub fn rating_count(aggregate: &Value) -> Option<u64> {
    match aggregate.as_object()?.get("ratingCount")? {
        Value::Number(n) => n.as_u64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64)
                .then_some(f as u64)
        }),
        Value::String(s) => digits_only(s),
        _ => None,
    }
}

fn digits_only(s: &str) -> Option<u64> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

pub fn genres(value: &Value) -> Vec<String> {
    match value {
        Value::String(_) => text(value).into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(text).collect(),
        _ => Vec::new(),
    }
}

pub fn duration(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|m| format!("PT{m}M")),
        Value::String(s) => {
            let s = s.trim();
            if ISO_DURATION_RE.is_match(s) && s.len() > 2 {
                return Some(s.to_owned());
            }
            let lower = s.to_ascii_lowercase();
            let caps = BARE_MINUTES_RE.captures(&lower)?;
            let minutes: u64 = caps.get(1)?.as_str().parse().ok()?;
            Some(format!("PT{minutes}M"))
        }
        _ => None,
    }
}

pub fn duration_minutes(iso: &str) -> Option<u64> {
    let caps = ISO_DURATION_RE.captures(iso.trim())?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let days = part(1)?;
    let hours = part(2)?;
    let minutes = part(3)?;
    let seconds = part(4)?;
    days.checked_mul(24 * 60)?
        .checked_add(hours.checked_mul(60)?)?
        .checked_add(minutes)?
        .checked_add(seconds / 60)
}
