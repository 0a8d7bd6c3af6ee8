//! Prompt construction for item photos.
//!
//! The style is a "disposable camera photo" kept deliberately short: the
//! image model's own rewriter embellishes anything long into studio
//! language. Every prompt is a pure function of the item's name, id, tags
//! and detail fields; picking a location phrase uses the numeric id, never
//! a random draw.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Item;

const LEAD_IN: &str = "Disposable camera photo.";
const TRAILER: &str = "Tilted slightly. No people visible.";

/// Maximum characters of `detail.contents` included for counted items.
const CONTENTS_LIMIT: usize = 60;

/// Rooms not listed here fall back to this one.
const FALLBACK_ROOM: &str = "storage";

static COUNT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("static regex"));
static COUNT_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)").expect("static regex"));

const ROOM_LOCATIONS: &[(&str, &[&str])] = &[
    (
        "kitchen",
        &[
            "on the kitchen counter next to a dish towel, some mail, and a coffee mug",
            "on the kitchen counter with a sponge and some crumbs nearby",
            "crammed on a kitchen shelf next to mismatched jars and a box of cereal",
            "on the kitchen island with a paper towel roll and some fruit nearby",
        ],
    ),
    (
        "bedroom",
        &[
            "on a nightstand next to a lamp and a phone charger cord",
            "on the bed with rumpled sheets and a pillow visible",
            "in the corner of a bedroom with some clothes on the floor",
            "on top of a dresser with a water glass and loose change",
        ],
    ),
    (
        "bathroom",
        &[
            "on the bathroom counter next to the sink and a toothbrush",
            "in a bathroom cabinet with the door open, other stuff crammed around it",
            "on the edge of the bathtub with shampoo bottles nearby",
            "on a bathroom shelf with other toiletries and a roll of toilet paper visible",
        ],
    ),
    (
        "living_room",
        &[
            "in the living room with a remote control and some magazines on the coffee table",
            "next to the sofa with a throw blanket bunched up",
            "on the living room floor near the couch with some shoes nearby",
            "in the corner of the living room with a lamp cord visible",
        ],
    ),
    (
        "garage",
        &[
            "on a messy garage shelf with paint cans and random stuff",
            "on the garage floor next to some boxes and a broom",
            "hanging on a garage pegboard wall with tools around it",
            "on a workbench in the garage with sawdust and screws scattered around",
        ],
    ),
    (
        "closet",
        &[
            "hanging in a closet crammed between other clothes",
            "folded on a closet shelf with other stuff piled around",
            "on the closet floor with shoes and a box nearby",
            "stuffed on a crowded closet shelf",
        ],
    ),
    (
        "office",
        &[
            "on a desk next to a keyboard and some sticky notes",
            "on an office shelf with papers and binders around it",
            "on the desk with some pens, a mug, and papers scattered around",
            "next to a computer monitor with cables visible",
        ],
    ),
    (
        "dining_room",
        &[
            "on the dining table with a placemat and some napkins",
            "on a sideboard in the dining room with some candles and clutter",
            "in the dining room with chairs pushed out from the table",
            "on the dining table next to a centerpiece and some mail",
        ],
    ),
    (
        "laundry",
        &[
            "on top of the washing machine with a detergent bottle nearby",
            "on a shelf in the laundry room with dryer sheets and cleaning supplies",
            "in the laundry area with a basket of clothes nearby",
            "next to the dryer with some lint and a sock on the floor",
        ],
    ),
    (
        "storage",
        &[
            "on a shelf in a storage room with cardboard boxes stacked around it",
            "in a storage area with other random stuff piled nearby",
            "on the floor of a storage closet with a vacuum and bags",
            "sitting in a cardboard box in a dimly lit storage area",
        ],
    ),
    (
        "entryway",
        &[
            "near the front door on a small table with keys and mail",
            "on a bench in the entryway with shoes underneath",
            "hanging on hooks by the front door with coats and bags",
            "on the floor near the door with shoes and an umbrella",
        ],
    ),
];

const SUBCATEGORY_LOCATIONS: &[(&str, &str)] = &[
    ("outerwear", "hanging in a closet crammed between other jackets"),
    ("casual", "folded in a messy pile on a dresser"),
    ("formal", "hanging on a closet rod with other clothes shoved to the side"),
    ("activewear", "tossed on a bedroom chair with other clothes"),
    ("accessories", "laid out on a dresser top with some loose coins and a receipt"),
    ("footwear", "on the closet floor with other shoes"),
    ("underwear", "folded in an open dresser drawer"),
    ("loungewear", "draped over the arm of the sofa with a blanket"),
    ("swimwear", "in a drawer with other summer stuff"),
    ("major", "in its installed position in the kitchen with magnets and a towel on the handle"),
    ("countertop", "on the kitchen counter with crumbs and a towel nearby"),
    ("cookware", "on the stovetop with a spatula and some oil splatters nearby"),
    ("bakeware", "stacked in a kitchen cabinet with the door open"),
    ("prep", "on the kitchen counter next to a cutting board with food residue"),
    ("utensils", "in a utensil holder on the counter with other stuff around"),
    ("drinkware", "on the kitchen counter next to the sink"),
    ("dinnerware", "stacked on a kitchen shelf, a bit uneven"),
    ("pantry", "on a pantry shelf with other boxes and cans"),
    ("seating", "in its usual spot in the room with a throw pillow and remote nearby"),
    ("bed", "in the bedroom with messy sheets"),
    ("tables", "in its usual position with some stuff sitting on it"),
    ("entertainment", "in its spot with some cables visible"),
    ("audio", "on a shelf near other electronics and some dust"),
    ("gaming", "near the TV with controllers and some game cases around"),
    ("cables", "tangled in a drawer or piled on a desk"),
    ("lighting", "in its usual position, turned off, with some dust"),
    ("wall_art", "hanging on the wall, slightly crooked"),
    ("textiles", "on a sofa, a bit bunched up"),
    ("plants", "on a windowsill with some dead leaves around it"),
    ("rugs", "on the floor with furniture legs visible"),
    ("cookbooks", "on a kitchen shelf leaning against each other"),
    ("current", "on a nightstand next to a lamp and phone charger"),
    ("reference", "on a bookshelf, spine-out, crammed between other books"),
    ("bedding", "folded on the bed or stuffed in a linen closet"),
    ("blankets", "folded on a shelf or tossed on a chair"),
    ("towels", "on a shelf or hanging on a rack, a bit wrinkled"),
    ("cleaning", "under the sink or in a closet with other cleaning supplies"),
    ("holiday", "in a cardboard storage box with other decorations visible"),
    ("camping", "on a garage shelf with other outdoor gear"),
];

/// Location phrases for `room`, if it has its own list.
pub fn room_locations(room: &str) -> Option<&'static [&'static str]> {
    ROOM_LOCATIONS
        .iter()
        .find(|(name, _)| *name == room)
        .map(|(_, phrases)| *phrases)
}

/// Dedicated location phrase for a subcategory.
pub fn subcategory_location(subcategory: &str) -> Option<&'static str> {
    SUBCATEGORY_LOCATIONS
        .iter()
        .find(|(name, _)| *name == subcategory)
        .map(|(_, phrase)| *phrase)
}

/// Build the full image prompt for `item`.
pub fn build_prompt(item: &Item) -> String {
    let core = core_description(item);
    let location = location_context(item);
    format!(
        "{} {}, {}. {}",
        LEAD_IN,
        upper_first(&core),
        location,
        TRAILER
    )
}

/// Generic visual description of the item itself.
///
/// Counted items ("Socks (12)") become "12 socks", optionally followed by
/// their contents. Everything else gets an article, an optional color and
/// an optional "made of" clause.
pub fn core_description(item: &Item) -> String {
    let name = item.name.as_str();

    if let Some(caps) = COUNT_SUFFIX.captures(name) {
        let digits = &caps[1];
        let count = digits
            .parse::<u64>()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| digits.to_string());
        let base_name = COUNT_STRIP.replace_all(name, "").to_lowercase();

        return match item.detail_text("contents") {
            Some(contents) => format!(
                "{} {}: {}",
                count,
                base_name,
                truncate_chars(contents, CONTENTS_LIMIT)
            ),
            None => format!("{} {}", count, base_name),
        };
    }

    let lower_name = name.to_lowercase();
    let mut parts = Vec::with_capacity(2);

    match item.detail_text("color") {
        Some(color) => {
            let color = color.to_lowercase();
            parts.push(format!("{} {} {}", article(&color), color, lower_name));
        }
        None => parts.push(format!("{} {}", article(&lower_name), lower_name)),
    }

    if let Some(material) = item.detail_text("material") {
        let material = material.to_lowercase();
        if !lower_name.contains(&material) {
            parts.push(format!("made of {}", material));
        }
    }

    parts.join(", ")
}

/// Where the item sits in the photo.
pub fn location_context(item: &Item) -> &'static str {
    if item.tags.category != "furniture" {
        if let Some(phrase) = item
            .tags
            .subcategory
            .as_deref()
            .and_then(subcategory_location)
        {
            return phrase;
        }
    }

    let locations = room_locations(&item.tags.room)
        .or_else(|| room_locations(FALLBACK_ROOM))
        .unwrap_or(&[]);
    if locations.is_empty() {
        return "";
    }

    let id_num = item.id_number().unwrap_or(0);
    locations[(id_num % locations.len() as u64) as usize]
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
