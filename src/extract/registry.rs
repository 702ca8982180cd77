//! Extraction of the rooms/teachers/students directory from the schedule
//! menu markup.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dom;
use crate::error::Result;

static SECTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ulroot > li.submenu.liroot").unwrap());
static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.link > a").unwrap());

// Schedule link types, as carried in the href query string.
const TYPE_TEACHER: &str = "1";
const TYPE_STUDENT: &str = "2";
const TYPE_ROOM: &str = "4";
// Class schedules share the menu but have no place in the directory.
const TYPE_CLASS: &str = "9";

/// The directory of everything a schedule can be looked up for, keyed by
/// display name. Duplicate names keep the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub teachers: HashMap<String, RegistryEntry>,
    pub students: HashMap<String, RegistryEntry>,
    pub rooms: HashMap<String, RegistryEntry>,
}

/// One directory entry; the id is what schedule requests expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: u32,
    pub name: String,
}

/// Extract every usable link of the menu into the directory.
pub fn extract(doc: &Html) -> Result<Registry> {
    let mut registry = Registry::default();

    for section in doc.select(&SECTIONS) {
        for link in section.select(&LINKS) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let name = dom::trimmed_text(link);
            if name.is_empty() {
                continue;
            }

            let (entry_type, raw_id) = query_params(href);
            if entry_type.as_deref() == Some(TYPE_CLASS) {
                continue;
            }
            let Some(raw_id) = raw_id else { continue };
            if raw_id.is_empty() {
                continue;
            }
            let id: u32 = match raw_id.parse() {
                Ok(id) => id,
                Err(err) => {
                    warn!("skipping link with unparsable id {raw_id:?}: {err}");
                    continue;
                }
            };

            let entry = RegistryEntry {
                id,
                name: name.clone(),
            };
            match entry_type.as_deref() {
                Some(TYPE_TEACHER) => {
                    registry.teachers.insert(name, entry);
                }
                Some(TYPE_STUDENT) => {
                    registry.students.insert(name, entry);
                }
                Some(TYPE_ROOM) => {
                    registry.rooms.insert(name, entry);
                }
                _ => {}
            }
        }
    }

    Ok(registry)
}

// First "type" and "id" values of a link target's query string. Menu links
// are relative, so only the part between "?" and any fragment is read.
fn query_params(href: &str) -> (Option<String>, Option<String>) {
    let query = href.split_once('?').map(|(_, rest)| rest).unwrap_or("");
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    let mut entry_type = None;
    let mut id = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "type" if entry_type.is_none() => entry_type = Some(value.into_owned()),
            "id" if id.is_none() => id = Some(value.into_owned()),
            _ => {}
        }
    }
    (entry_type, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"<ul class="ulroot">
<li class="submenu liroot">Salles<ul>
<li class="link"><a href="index.php?type=4&amp;id=17&amp;year=2024">A101</a></li>
<li class="link"><a href="index.php?type=4&amp;id=23&amp;year=2024">B02a</a></li>
</ul></li>
<li class="submenu liroot">Enseignants<ul>
<li class="link"><a href="index.php?type=1&amp;id=301">Dupont Albert</a></li>
<li class="link"><a href="index.php?type=1&amp;id=302"> Favre Claire </a></li>
<li class="link"><a href="index.php?type=9&amp;id=99">ISC-1A</a></li>
<li class="link"><a href="index.php?type=6&amp;id=7">Horaire global</a></li>
<li class="link"><a href="index.php?type=1">Sans identifiant</a></li>
<li class="link"><a href="index.php?type=1&amp;id=abc">Cassé</a></li>
<li class="link"><a href="index.php?type=1&amp;id=303"></a></li>
</ul></li>
<li class="submenu liroot">Étudiants<ul>
<li class="link"><a href="index.php?type=2&amp;id=4242">Rossier Marc</a></li>
<li class="link"><a href="index.php?type=2&amp;id=4250">Rossier Marc</a></li>
</ul></li>
</ul>"#;

    #[test]
    fn links_land_in_their_buckets() {
        let registry = extract(&Html::parse_document(MENU)).unwrap();

        assert_eq!(registry.rooms.len(), 2);
        assert_eq!(registry.rooms["A101"].id, 17);
        assert_eq!(registry.rooms["B02a"].id, 23);

        assert_eq!(registry.teachers.len(), 2);
        assert_eq!(registry.teachers["Dupont Albert"].id, 301);
        assert_eq!(registry.teachers["Favre Claire"].id, 302);

        assert_eq!(registry.students.len(), 1);
    }

    #[test]
    fn class_links_and_unusable_links_are_skipped() {
        let registry = extract(&Html::parse_document(MENU)).unwrap();

        // type 9 is a class schedule, type 6 has no bucket, the rest lack a
        // usable id or name.
        assert!(!registry.teachers.contains_key("ISC-1A"));
        assert!(!registry.teachers.contains_key("Horaire global"));
        assert!(!registry.teachers.contains_key("Sans identifiant"));
        assert!(!registry.teachers.contains_key("Cassé"));
    }

    #[test]
    fn duplicate_names_keep_the_last_entry() {
        let registry = extract(&Html::parse_document(MENU)).unwrap();
        assert_eq!(registry.students["Rossier Marc"].id, 4250);
    }

    #[test]
    fn query_strings_are_read_relative_and_decoded() {
        assert_eq!(
            query_params("index.php?type=4&id=17"),
            (Some("4".to_string()), Some("17".to_string()))
        );
        assert_eq!(
            query_params("index.php?id=A%20B#frag"),
            (None, Some("A B".to_string()))
        );
        assert_eq!(query_params("index.php"), (None, None));
    }
}
