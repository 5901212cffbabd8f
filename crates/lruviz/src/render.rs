//! Text rendering of cache state and trace steps

use std::collections::HashSet;

use lrutrace::{CacheStats, StepRecord, LISTING};

/// `HEAD ⇄ [k:v] ⇄ ... ⇄ TAIL`, with the entry for `highlight` wrapped in `>...<`
pub fn render_list(snapshot: &[(String, String)], highlight: Option<&str>) -> String {
    let mut out = String::from("HEAD");
    for (key, value) in snapshot {
        out.push_str(" ⇄ ");
        if highlight == Some(key.as_str()) {
            out.push_str(&format!("[>{}:{}<]", key, value));
        } else {
            out.push_str(&format!("[{}:{}]", key, value));
        }
    }
    out.push_str(" ⇄ TAIL");
    out
}

/// `map {a, b, c}` with keys sorted for stable output
pub fn render_index(keys: &HashSet<String>) -> String {
    let mut keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    keys.sort_unstable();
    format!("map {{{}}}", keys.join(", "))
}

/// One trace line: `[ 3/7] ln15 EVICT   capacity full: ...`
pub fn render_step(position: usize, total: usize, record: &StepRecord<String, String>) -> String {
    let label = record.action.map(|a| a.label()).unwrap_or("-");
    format!(
        "[{:>2}/{}] ln{:<2} {:<7} {}",
        position + 1,
        total,
        record.line,
        label,
        record.description
    )
}

/// The algorithm listing, with `→` in front of `current` (1-based)
pub fn render_listing(current: Option<usize>) -> String {
    LISTING
        .iter()
        .enumerate()
        .map(|(i, src)| {
            let marker = if current == Some(i + 1) { "→" } else { " " };
            format!("{} {:>2} │ {}", marker, i + 1, src)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Size, capacity and hit/miss counters
pub fn render_stats(stats: &CacheStats, len: usize, capacity: usize) -> String {
    format!(
        "size: {}/{}\n\
         hits: {}\n\
         misses: {}\n\
         hit ratio: {:.2}\n\
         inserts: {}\n\
         updates: {}\n\
         evictions: {}",
        len,
        capacity,
        stats.hits(),
        stats.misses(),
        stats.hit_ratio(),
        stats.inserts(),
        stats.updates(),
        stats.evictions(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrutrace::{Action, LruCache};

    fn snapshot() -> Vec<(String, String)> {
        vec![
            ("2".to_string(), "200".to_string()),
            ("1".to_string(), "100".to_string()),
        ]
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render_list(&[], None), "HEAD ⇄ TAIL");
        assert_eq!(
            render_list(&snapshot(), Some("1")),
            "HEAD ⇄ [2:200] ⇄ [>1:100<] ⇄ TAIL"
        );
    }

    #[test]
    fn test_render_index_sorted() {
        let keys: HashSet<String> = ["b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(render_index(&keys), "map {a, b, c}");
    }

    #[test]
    fn test_render_step() {
        let mut cache = LruCache::new(1).unwrap();
        cache.put("a".to_string(), "x".to_string());
        let records = cache.put("b".to_string(), "y".to_string()).trace.to_records();

        let evict = records
            .iter()
            .position(|r| r.action == Some(Action::Evict))
            .unwrap();
        assert_eq!(
            render_step(evict, records.len(), &records[evict]),
            "[ 3/7] ln15 EVICT   capacity full: remove back.prev (LRU) key=a"
        );

        let forget = &records[evict + 1];
        assert!(render_step(evict + 1, records.len(), forget).contains(" -       map.remove(a)"));
    }

    #[test]
    fn test_render_listing_marks_current_line() {
        let listing = render_listing(Some(2));
        let lines: Vec<_> = listing.lines().collect();

        assert_eq!(lines.len(), LISTING.len());
        assert!(lines[1].starts_with("→  2 │"));
        assert!(lines[0].starts_with("   1 │"));
    }
}
