//! Unit catalog
//!
//! Fixed option lists offered by the rapid-entry form.

/// Training modules, in curriculum order
pub const MODULES: &[&str] = &[
    "Módulo Asociación",
    "Módulo Discriminación",
    "Módulo Transición",
    "Módulo Discriminación II",
    "Módulo Aleatorios",
    "Módulo Vacíos",
    "Módulo Asociación II",
];

const MODULE_OBJECTIVES: &[(&str, &[&str])] = &[
    ("Módulo Asociación", &["OCP1", "OCP2", "OCP3", "OCP4"]),
    (
        "Módulo Discriminación",
        &["OCP1", "OCP2", "OCP3", "OCP4", "OCP5", "OCP6", "OCP7", "OCP8", "OCP9"],
    ),
    ("Módulo Transición", &["OCP1", "OCP2", "OCP3"]),
    ("Módulo Discriminación II", &["OCP1"]),
    ("Módulo Aleatorios", &["OCP1"]),
    ("Módulo Vacíos", &["OCP1", "OCP2", "OCP3"]),
    ("Módulo Asociación II", &["OCP1"]),
];

pub const RECORD_TYPES: &[&str] = &["OCP", "10UA", "20UA"];

pub const REINFORCERS: &[&str] = &["Comestible", "Juguete", "Social"];

pub const SCHEDULES: &[&str] = &["Fijo", "Variable"];

/// Target odors available for `module`; empty for modules outside the catalog
pub fn objectives_for(module: &str) -> &'static [&'static str] {
    MODULE_OBJECTIVES
        .iter()
        .find(|(name, _)| *name == module)
        .map(|(_, odors)| *odors)
        .unwrap_or(&[])
}

/// Every target odor across modules, first-seen order, without duplicates
pub fn all_odors() -> Vec<&'static str> {
    let mut odors: Vec<&'static str> = Vec::new();
    for (_, module_odors) in MODULE_OBJECTIVES {
        for odor in module_odors.iter() {
            if !odors.contains(odor) {
                odors.push(*odor);
            }
        }
    }
    odors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_module_has_objectives() {
        for module in MODULES {
            assert!(!objectives_for(module).is_empty(), "{module}");
        }
        assert!(objectives_for("Módulo Inexistente").is_empty());
    }

    #[test]
    fn test_all_odors() {
        let odors = all_odors();
        assert_eq!(odors.len(), 9);
        assert_eq!(odors[0], "OCP1");
        assert_eq!(odors[8], "OCP9");
    }
}
