//! Bundled reef-fish knowledge base.
//!
//! The detector emits 26 class ids that collapse onto 13 reef-fish
//! families. Lookups are synchronous and read-only over static data.

use crate::types::ClassId;

/// Display language for names and descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Zh,
    En,
}

/// Base path of the bundled family illustrations.
pub const IMAGE_BASE_PATH: &str = "/marine_clean_images";

/// One fish family as shown on catalogue and report screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FishRecord {
    /// Stable family key, e.g. `"acanthuridae"`.
    pub key: &'static str,
    /// Catalogue grouping.
    pub group: &'static str,
    pub name_zh: &'static str,
    pub name_en: &'static str,
    pub scientific_name: &'static str,
    pub is_toxic: bool,
    pub toxicity_note_en: &'static str,
    pub description_zh: &'static str,
    pub description_en: &'static str,
    /// File name under [`IMAGE_BASE_PATH`].
    pub image_file: &'static str,
}

impl FishRecord {
    pub fn name(&self, language: Language) -> &'static str {
        match language {
            Language::Zh => self.name_zh,
            Language::En => self.name_en,
        }
    }

    pub fn description(&self, language: Language) -> &'static str {
        match language {
            Language::Zh => self.description_zh,
            Language::En => self.description_en,
        }
    }

    /// Image reference relative to the app's static root.
    pub fn image_path(&self) -> String {
        format!("{IMAGE_BASE_PATH}/{}", self.image_file)
    }
}

static FAMILIES: [FishRecord; 13] = [
    FishRecord {
        key: "acanthuridae",
        group: "reef",
        name_zh: "刺尾鱼科",
        name_en: "Surgeonfishes",
        scientific_name: "Acanthuridae",
        is_toxic: true,
        toxicity_note_en: "Sharp scalpel spines on both sides of the tail stalk can cause deep cuts.",
        description_zh: "尾柄两侧具锋利的骨质棘，常成群在珊瑚礁上啃食藻类。",
        description_en: "Algae grazers that roam reefs in schools, armed with blade-like tail spines.",
        image_file: "acanthuridae.jpg",
    },
    FishRecord {
        key: "balistidae",
        group: "reef",
        name_zh: "鳞鲀科",
        name_en: "Triggerfishes",
        scientific_name: "Balistidae",
        is_toxic: true,
        toxicity_note_en: "Strong teeth and territorial during nesting; large individuals may carry ciguatoxin.",
        description_zh: "体型侧扁，背鳍第一棘可锁定，繁殖期领地意识强烈。",
        description_en: "Deep-bodied fish with a locking dorsal spine that defend nests aggressively.",
        image_file: "balistidae.jpg",
    },
    FishRecord {
        key: "carangidae",
        group: "pelagic",
        name_zh: "鲹科",
        name_en: "Jacks",
        scientific_name: "Carangidae",
        is_toxic: false,
        toxicity_note_en: "Generally non-toxic fast predators.",
        description_zh: "游速快的掠食性鱼类，常在礁缘巡游捕食。",
        description_en: "Fast silver predators that patrol reef edges in loose groups.",
        image_file: "carangidae.jpg",
    },
    FishRecord {
        key: "ephippidae",
        group: "reef",
        name_zh: "白鲳科",
        name_en: "Spadefishes",
        scientific_name: "Ephippidae",
        is_toxic: false,
        toxicity_note_en: "Non-toxic and gentle.",
        description_zh: "体高而侧扁，性情温和，常好奇地靠近潜水员。",
        description_en: "Tall disc-shaped fish, calm and often curious around divers.",
        image_file: "ephippidae.jpg",
    },
    FishRecord {
        key: "labridae",
        group: "reef",
        name_zh: "隆头鱼科",
        name_en: "Wrasses",
        scientific_name: "Labridae",
        is_toxic: false,
        toxicity_note_en: "Mostly non-toxic; large species are protected.",
        description_zh: "种类繁多、色彩鲜艳，部分种类为珊瑚礁清洁鱼。",
        description_en: "A huge, colourful family that includes the reef's cleaner fish.",
        image_file: "labridae.jpg",
    },
    FishRecord {
        key: "lutjanidae",
        group: "reef",
        name_zh: "笛鲷科",
        name_en: "Snappers",
        scientific_name: "Lutjanidae",
        is_toxic: false,
        toxicity_note_en: "No venomous spines; large individuals may accumulate ciguatoxin.",
        description_zh: "常见的经济鱼类，白天常在礁石阴影处集群。",
        description_en: "Common food fish that school in reef shade during the day.",
        image_file: "lutjanidae.jpg",
    },
    FishRecord {
        key: "pomacanthidae",
        group: "reef",
        name_zh: "刺盖鱼科",
        name_en: "Angelfishes",
        scientific_name: "Pomacanthidae",
        is_toxic: false,
        toxicity_note_en: "Non-toxic; blunt gill-cover spines without venom glands.",
        description_zh: "色彩艳丽，鳃盖具强棘，多在珊瑚丛附近活动。",
        description_en: "Brilliantly patterned fish with a stout spine on each gill cover.",
        image_file: "pomacanthidae.jpg",
    },
    FishRecord {
        key: "pomacentridae",
        group: "reef",
        name_zh: "雀鲷科",
        name_en: "Damselfishes",
        scientific_name: "Pomacentridae",
        is_toxic: false,
        toxicity_note_en: "Generally non-toxic.",
        description_zh: "体型小巧，常守护珊瑚枝间的领地，包括小丑鱼。",
        description_en: "Small territorial reef fish, clownfish included.",
        image_file: "pomacentridae.jpg",
    },
    FishRecord {
        key: "scaridae",
        group: "reef",
        name_zh: "鹦嘴鱼科",
        name_en: "Parrotfishes",
        scientific_name: "Scaridae",
        is_toxic: false,
        toxicity_note_en: "Non-toxic.",
        description_zh: "牙齿愈合成喙状，啃食珊瑚上的藻类，产生大量白沙。",
        description_en: "Beaked grazers that scrape algae off coral and produce reef sand.",
        image_file: "scaridae.jpg",
    },
    FishRecord {
        key: "scombridae",
        group: "pelagic",
        name_zh: "鲭科",
        name_en: "Mackerels and tunas",
        scientific_name: "Scombridae",
        is_toxic: false,
        toxicity_note_en: "Non-toxic.",
        description_zh: "流线型的远洋快速游泳者，重要的经济鱼类。",
        description_en: "Streamlined open-water sprinters of major commercial value.",
        image_file: "scombridae.jpg",
    },
    FishRecord {
        key: "serranidae",
        group: "reef",
        name_zh: "鮨科",
        name_en: "Groupers",
        scientific_name: "Serranidae",
        is_toxic: false,
        toxicity_note_en: "Mostly non-toxic; some large groupers may accumulate ciguatoxin.",
        description_zh: "伏击型掠食者，常躲藏在洞穴和礁石缝隙中。",
        description_en: "Ambush predators that lurk in caves and crevices.",
        image_file: "serranidae.jpg",
    },
    FishRecord {
        key: "shark",
        group: "pelagic",
        name_zh: "鲨鱼",
        name_en: "Sharks",
        scientific_name: "Selachimorpha",
        is_toxic: false,
        toxicity_note_en: "Non-toxic apex predators; keep a respectful distance.",
        description_zh: "海洋顶级掠食者，对维持生态平衡至关重要。",
        description_en: "Apex predators essential to a balanced reef ecosystem.",
        image_file: "shark.jpg",
    },
    FishRecord {
        key: "zanclidae",
        group: "reef",
        name_zh: "镰鱼科",
        name_en: "Moorish idol",
        scientific_name: "Zanclidae",
        is_toxic: false,
        toxicity_note_en: "Non-toxic.",
        description_zh: "吻部突出，背鳍延长成丝状，极易辨认。",
        description_en: "Unmistakable long-snouted fish with a trailing dorsal streamer.",
        image_file: "zanclidae.jpg",
    },
];

/// Detector class id -> family key.
static CLASS_TO_FAMILY: [&str; 26] = [
    "acanthuridae",
    "balistidae",
    "carangidae",
    "ephippidae",
    "labridae",
    "lutjanidae",
    "pomacanthidae",
    "pomacentridae",
    "scaridae",
    "scombridae",
    "serranidae",
    "shark",
    "zanclidae",
    "zanclidae",
    "pomacanthidae",
    "pomacentridae",
    "serranidae",
    "carangidae",
    "scaridae",
    "shark",
    "lutjanidae",
    "ephippidae",
    "acanthuridae",
    "balistidae",
    "scombridae",
    "labridae",
];

/// Resolve a detector class id to its family record.
pub fn lookup(class_id: ClassId) -> Option<&'static FishRecord> {
    let key = CLASS_TO_FAMILY.get(usize::try_from(class_id).ok()?)?;
    by_key(key)
}

/// Find a family by its key (case-insensitive).
pub fn by_key(key: &str) -> Option<&'static FishRecord> {
    FAMILIES.iter().find(|f| f.key.eq_ignore_ascii_case(key))
}

/// Every family in catalogue order.
pub fn all() -> &'static [FishRecord] {
    &FAMILIES
}

pub fn toxic() -> impl Iterator<Item = &'static FishRecord> {
    FAMILIES.iter().filter(|f| f.is_toxic)
}

pub fn safe() -> impl Iterator<Item = &'static FishRecord> {
    FAMILIES.iter().filter(|f| !f.is_toxic)
}

pub fn by_group(group: &str) -> Vec<&'static FishRecord> {
    FAMILIES
        .iter()
        .filter(|f| f.group.eq_ignore_ascii_case(group))
        .collect()
}

/// Case-insensitive substring search over the name, scientific name and
/// description in the requested language.
pub fn search(query: &str, language: Language) -> Vec<&'static FishRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    FAMILIES
        .iter()
        .filter(|f| {
            f.name(language).to_lowercase().contains(&needle)
                || f.scientific_name.to_lowercase().contains(&needle)
                || f.description(language).to_lowercase().contains(&needle)
        })
        .collect()
}

/// Display name for a class id, falling back to a generic label for ids
/// the catalogue does not know.
pub fn display_name(class_id: ClassId, language: Language) -> String {
    match lookup(class_id) {
        Some(record) => record.name(language).to_string(),
        None => match language {
            Language::Zh => format!("未知鱼类 #{class_id}"),
            Language::En => format!("Unknown fish #{class_id}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_class_maps_to_a_family() {
        for class_id in 0..26 {
            assert!(lookup(class_id).is_some(), "class {class_id} unmapped");
        }
        assert!(lookup(26).is_none());
        assert!(lookup(u32::MAX).is_none());
    }

    #[test]
    fn toxic_classes_match_detector_configuration() {
        for class_id in [0, 1, 22, 23] {
            assert!(lookup(class_id).unwrap().is_toxic);
        }
        for class_id in (2..22).chain(24..26) {
            assert!(!lookup(class_id).unwrap().is_toxic, "class {class_id}");
        }
    }

    #[test]
    fn duplicated_classes_share_a_record() {
        assert_eq!(lookup(12).unwrap().key, lookup(13).unwrap().key);
        assert_eq!(lookup(11).unwrap().key, "shark");
        assert_eq!(lookup(19).unwrap().key, "shark");
    }

    #[test]
    fn search_is_case_insensitive_and_language_aware() {
        let hits = search("SHARK", Language::En);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "shark");

        let hits = search("鲨", Language::Zh);
        assert_eq!(hits[0].key, "shark");

        assert!(search("   ", Language::En).is_empty());
    }

    #[test]
    fn group_and_toxicity_filters() {
        assert_eq!(toxic().count(), 2);
        assert_eq!(safe().count(), 11);
        assert!(by_group("PELAGIC").iter().all(|f| f.group == "pelagic"));
        assert_eq!(by_group("pelagic").len(), 3);
    }

    #[test]
    fn display_name_falls_back_for_unknown_ids() {
        assert_eq!(display_name(11, Language::En), "Sharks");
        assert_eq!(display_name(99, Language::En), "Unknown fish #99");
    }

    #[test]
    fn image_path_is_rooted() {
        assert_eq!(by_key("scaridae").unwrap().image_path(), "/marine_clean_images/scaridae.jpg");
    }
}
