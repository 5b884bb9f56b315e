/// The twelve enchantments every item can roll, in canonical order.
pub const CANONICAL_ENCHANTMENTS: &[&str] = &[
    "Heavy",
    "Icy",
    "Turbo",
    "Shielded",
    "Restorative",
    "Toxic",
    "Fiery",
    "Shiny",
    "Deadly",
    "Radiant",
    "Obsidian",
    "Golden",
];

pub const DEFAULT_EFFECT: &str = "None";

/// Append a `"None"` pair for every canonical enchantment the source
/// omitted. Extracted pairs stay untouched; names outside the canonical
/// list stay too (the auditor reports them).
pub fn fill_defaults(enchants: &mut Vec<(String, String)>) {
    for name in CANONICAL_ENCHANTMENTS {
        if !enchants.iter().any(|(n, _)| n == name) {
            enchants.push(((*name).to_string(), DEFAULT_EFFECT.to_string()));
        }
    }
}

pub fn is_canonical(name: &str) -> bool {
    CANONICAL_ENCHANTMENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| (n.to_string(), format!("{} effect.", n)))
            .collect()
    }

    #[test]
    fn missing_enchants_get_none() {
        let mut enchants = pairs(&[
            "Heavy", "Icy", "Turbo", "Shielded", "Restorative", "Toxic", "Fiery", "Shiny",
            "Deadly",
        ]);
        fill_defaults(&mut enchants);

        assert_eq!(enchants.len(), 12);
        let filled: Vec<_> = enchants.iter().filter(|(_, e)| e == DEFAULT_EFFECT).collect();
        assert_eq!(filled.len(), 3);
        assert_eq!(enchants[0], ("Heavy".to_string(), "Heavy effect.".to_string()));
        assert!(enchants.iter().any(|(n, e)| n == "Golden" && e == "None"));
    }

    #[test]
    fn complete_set_is_untouched() {
        let mut enchants = pairs(CANONICAL_ENCHANTMENTS);
        let before = enchants.clone();
        fill_defaults(&mut enchants);
        assert_eq!(enchants, before);
    }

    #[test]
    fn empty_input_fills_all_twelve() {
        let mut enchants = Vec::new();
        fill_defaults(&mut enchants);
        assert_eq!(enchants.len(), 12);
        assert!(enchants.iter().all(|(_, e)| e == DEFAULT_EFFECT));
        assert_eq!(enchants[0].0, "Heavy");
        assert_eq!(enchants[11].0, "Golden");
    }

    #[test]
    fn unexpected_names_pass_through() {
        let mut enchants = pairs(&["Heavy", "Cursed"]);
        fill_defaults(&mut enchants);
        assert_eq!(enchants.len(), 13);
        assert!(enchants.iter().any(|(n, _)| n == "Cursed"));
        assert!(!is_canonical("Cursed"));
        assert!(is_canonical("Obsidian"));
    }
}
