//! Worklist selection: predicate filters, already-generated exclusion and
//! the diversity sampler.
//!
//! Filters run in a fixed order (room → category → ids → skip done →
//! sample). All but the last are plain intersections, so the order only
//! changes the counts reported along the way.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

use crate::models::Item;

/// What to narrow the item list down to.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub room: Option<String>,
    pub category: Option<String>,
    /// Explicit allow-list. When present, already-generated items are kept.
    pub ids: Option<Vec<String>>,
    /// Target sample size; 0 disables sampling.
    pub sample: usize,
}

/// One narrowing step, reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStep {
    Room { room: String, remaining: usize },
    Category { category: String, remaining: usize },
    Ids { remaining: usize },
    SkippedDone { skipped: usize },
    Sampled { selected: usize },
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStep::Room { room, remaining } => {
                write!(f, "Filtered to {} items in room: {}", remaining, room)
            }
            FilterStep::Category {
                category,
                remaining,
            } => write!(f, "Filtered to {} items in category: {}", remaining, category),
            FilterStep::Ids { remaining } => write!(f, "Filtered to {} items by ID", remaining),
            FilterStep::SkippedDone { skipped } => {
                write!(f, "Skipping {} already-generated items", skipped)
            }
            FilterStep::Sampled { selected } => {
                write!(f, "Selected diverse sample of {} items", selected)
            }
        }
    }
}

/// Split a comma-separated id list, trimming whitespace and dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn filter_by_room(items: Vec<Item>, room: &str) -> Vec<Item> {
    items.into_iter().filter(|i| i.tags.room == room).collect()
}

pub fn filter_by_category(items: Vec<Item>, category: &str) -> Vec<Item> {
    items
        .into_iter()
        .filter(|i| i.tags.category == category)
        .collect()
}

pub fn filter_by_ids(items: Vec<Item>, ids: &[String]) -> Vec<Item> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    items
        .into_iter()
        .filter(|i| wanted.contains(i.id.as_str()))
        .collect()
}

/// Build the worklist for `selection`.
///
/// `is_done` reports whether an id already has generated artifacts.
/// Returns the worklist and the steps that narrowed it.
pub fn select_items<R, F>(
    items: &[Item],
    selection: &Selection,
    is_done: F,
    rng: &mut R,
) -> (Vec<Item>, Vec<FilterStep>)
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut steps = Vec::new();
    let mut filtered = items.to_vec();

    if let Some(room) = &selection.room {
        filtered = filter_by_room(filtered, room);
        steps.push(FilterStep::Room {
            room: room.clone(),
            remaining: filtered.len(),
        });
    }

    if let Some(category) = &selection.category {
        filtered = filter_by_category(filtered, category);
        steps.push(FilterStep::Category {
            category: category.clone(),
            remaining: filtered.len(),
        });
    }

    match &selection.ids {
        Some(ids) => {
            filtered = filter_by_ids(filtered, ids);
            steps.push(FilterStep::Ids {
                remaining: filtered.len(),
            });
        }
        None => {
            let before = filtered.len();
            filtered.retain(|i| !is_done(i.id.as_str()));
            let skipped = before - filtered.len();
            if skipped > 0 {
                steps.push(FilterStep::SkippedDone { skipped });
            }
        }
    }

    if selection.sample > 0 && filtered.len() > selection.sample {
        filtered = select_diverse_sample(&filtered, selection.sample, rng);
        steps.push(FilterStep::Sampled {
            selected: filtered.len(),
        });
    }

    (filtered, steps)
}

/// Pick up to `count` items spread across rooms and, within each room,
/// across categories; top up uniformly at random if the spread falls short.
pub fn select_diverse_sample<R: Rng + ?Sized>(
    items: &[Item],
    count: usize,
    rng: &mut R,
) -> Vec<Item> {
    if items.is_empty() || count == 0 {
        return Vec::new();
    }

    let by_room = group_by(items.iter(), |i| i.tags.room.as_str());
    let per_room = (count / by_room.len()).max(1);
    let mut selected: Vec<&Item> = Vec::with_capacity(count);

    for (_, room_items) in by_room {
        let mut by_cat = group_by(room_items.into_iter(), |i| i.tags.category.as_str());
        let n_cats = by_cat.len();
        let mut picked = 0;
        let mut cat_idx = 0;

        while picked < per_room && by_cat.iter().any(|(_, bucket)| !bucket.is_empty()) {
            let bucket = &mut by_cat[cat_idx % n_cats].1;
            if !bucket.is_empty() {
                let idx = rng.gen_range(0..bucket.len());
                selected.push(bucket.swap_remove(idx));
                picked += 1;
            }
            cat_idx += 1;
            // Quotas larger than the room's supply would spin forever.
            if cat_idx > n_cats * 3 {
                break;
            }
        }
    }

    if selected.len() < count {
        let taken: HashSet<&str> = selected.iter().map(|i| i.id.as_str()).collect();
        let mut remaining: Vec<&Item> = items
            .iter()
            .filter(|i| !taken.contains(i.id.as_str()))
            .collect();
        remaining.shuffle(rng);
        let need = count - selected.len();
        selected.extend(remaining.into_iter().take(need));
    }

    selected.truncate(count);
    selected.into_iter().cloned().collect()
}

/// Group preserving first-seen key order.
fn group_by<'a, I, K>(items: I, key: K) -> Vec<(&'a str, Vec<&'a Item>)>
where
    I: Iterator<Item = &'a Item>,
    K: Fn(&'a Item) -> &'a str,
{
    let mut groups: Vec<(&'a str, Vec<&'a Item>)> = Vec::new();
    for item in items {
        let k = key(item);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, bucket)) => bucket.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{item_id, Item, ShorthandRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn item(position: usize, room: &str, category: &str) -> Item {
        let raw: ShorthandRecord = serde_json::from_value(json!({
            "n": format!("Thing {position}"), "v": 1,
            "t": { "room": room, "category": category },
            "d": "2020", "l": "2024", "u": "weekly", "a": "low", "i": "box"
        }))
        .unwrap();
        Item::from_shorthand(position, raw)
    }

    fn inventory() -> Vec<Item> {
        let layout = [
            ("kitchen", "cookware"),
            ("kitchen", "cookware"),
            ("kitchen", "appliances"),
            ("kitchen", "pantry"),
            ("bedroom", "clothing"),
            ("bedroom", "clothing"),
            ("bedroom", "bedding"),
            ("garage", "tools"),
            ("garage", "tools"),
            ("garage", "camping"),
            ("office", "electronics"),
            ("office", "books"),
        ];
        layout
            .iter()
            .enumerate()
            .map(|(i, (room, cat))| item(i + 1, room, cat))
            .collect()
    }

    fn ids(items: &[Item]) -> Vec<String> {
        let mut ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn parse_id_list_trims() {
        assert_eq!(
            parse_id_list(" obj-001, obj-005 ,,"),
            vec!["obj-001".to_string(), "obj-005".to_string()]
        );
    }

    #[test]
    fn room_and_category_filters_commute() {
        let items = inventory();
        let a = filter_by_category(filter_by_room(items.clone(), "kitchen"), "cookware");
        let b = filter_by_room(filter_by_category(items, "cookware"), "kitchen");
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn skips_done_unless_ids_given() {
        let items = inventory();
        let mut rng = StdRng::seed_from_u64(1);
        let done = |id: &str| id == "obj-001" || id == "obj-002";

        let sel = Selection {
            room: Some("kitchen".into()),
            ..Default::default()
        };
        let (list, steps) = select_items(&items, &sel, done, &mut rng);
        assert_eq!(ids(&list), ["obj-003", "obj-004"]);
        assert_eq!(
            steps,
            vec![
                FilterStep::Room {
                    room: "kitchen".into(),
                    remaining: 4
                },
                FilterStep::SkippedDone { skipped: 2 },
            ]
        );

        let sel = Selection {
            ids: Some(vec!["obj-001".into(), "obj-012".into()]),
            ..Default::default()
        };
        let (list, steps) = select_items(&items, &sel, done, &mut rng);
        assert_eq!(ids(&list), ["obj-001", "obj-012"]);
        assert_eq!(steps, vec![FilterStep::Ids { remaining: 2 }]);
    }

    #[test]
    fn step_messages() {
        assert_eq!(
            FilterStep::Room {
                room: "kitchen".into(),
                remaining: 3
            }
            .to_string(),
            "Filtered to 3 items in room: kitchen"
        );
        assert_eq!(
            FilterStep::Sampled { selected: 5 }.to_string(),
            "Selected diverse sample of 5 items"
        );
    }

    #[test]
    fn sample_larger_than_pool_returns_everything() {
        let items = inventory();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_diverse_sample(&items, items.len() + 5, &mut rng);
        assert_eq!(ids(&picked), ids(&items));

        let sel = Selection {
            sample: 50,
            ..Default::default()
        };
        let (list, steps) = select_items(&items, &sel, |_| false, &mut rng);
        assert_eq!(list.len(), items.len());
        assert!(steps.is_empty());
    }

    #[test]
    fn sample_has_exact_size_and_no_duplicates() {
        let items = inventory();
        let all: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for n in 1..items.len() {
                let picked = select_diverse_sample(&items, n, &mut rng);
                assert_eq!(picked.len(), n);
                let unique: HashSet<String> = picked.iter().map(|i| i.id.clone()).collect();
                assert_eq!(unique.len(), n);
                assert!(unique.is_subset(&all));
            }
        }
    }

    #[test]
    fn sample_spans_rooms() {
        let items = inventory();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_diverse_sample(&items, 4, &mut rng);
            let rooms: HashSet<&str> = picked.iter().map(|i| i.tags.room.as_str()).collect();
            assert_eq!(rooms.len(), 4, "seed {seed} missed a room");
        }
    }

    #[test]
    fn sample_cycles_categories_within_room() {
        let items = inventory();
        let kitchen = filter_by_room(items, "kitchen");
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_diverse_sample(&kitchen, 3, &mut rng);
            let cats: HashSet<&str> = picked.iter().map(|i| i.tags.category.as_str()).collect();
            assert_eq!(cats.len(), 3, "seed {seed} repeated a category");
        }
    }

    #[test]
    fn sample_tops_up_when_quota_cannot_be_met() {
        // One room with a single item, another with many: per-room quota of 3
        // leaves the small room short, and the fill step makes up the gap.
        let mut items = vec![item(1, "entryway", "shoes")];
        items.extend((2..=10).map(|i| item(i, "garage", "tools")));
        let mut rng = StdRng::seed_from_u64(3);
        let picked = select_diverse_sample(&items, 6, &mut rng);
        assert_eq!(picked.len(), 6);
        assert!(picked.iter().any(|i| i.id == item_id(1)));
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let items = inventory();
        let a = select_diverse_sample(&items, 5, &mut StdRng::seed_from_u64(99));
        let b = select_diverse_sample(&items, 5, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
