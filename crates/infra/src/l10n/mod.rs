use calendar_reminders_domain::Locale;
use std::collections::HashMap;

/// Lookup of translated strings keyed by their English source text
pub trait IStringCatalog: Send + Sync {
    fn translate(&self, language: &str, key: &str) -> Option<String>;
}

/// Translates `key`, falling back to the English source text
pub fn t(catalog: &dyn IStringCatalog, locale: Locale, key: &str) -> String {
    catalog
        .translate(locale.language(), key)
        .unwrap_or_else(|| key.to_string())
}

/// Translates `key` and replaces each `%s` with the next argument
pub fn t_args(catalog: &dyn IStringCatalog, locale: Locale, key: &str, args: &[&str]) -> String {
    let template = t(catalog, locale, key);
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template.as_str();
    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        out.push_str(args.next().copied().unwrap_or_default());
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Translates the singular or plural form and replaces `%n` with `n`
pub fn t_plural(
    catalog: &dyn IStringCatalog,
    locale: Locale,
    singular: &str,
    plural: &str,
    n: i64,
) -> String {
    let key = if n == 1 { singular } else { plural };
    t(catalog, locale, key).replace("%n", &n.to_string())
}

/// Catalog with the strings shipped with the service
pub struct StaticCatalog {
    tables: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const DE: &[(&str, &str)] = &[
    ("Don't forget to go to %s", "Vergiss nicht: %s"),
    ("When:", "Wann:"),
    ("Where:", "Wo:"),
    ("Description:", "Beschreibung:"),
    ("Link:", "Link:"),
    ("Untitled event", "Unbenannter Termin"),
    ("Your event \"%s\" is in %s", "Dein Termin \"%s\" beginnt in %s"),
    ("Your event \"%s\" has started", "Dein Termin \"%s\" hat begonnen"),
    ("%n minute", "%n Minute"),
    ("%n minutes", "%n Minuten"),
    ("%n hour", "%n Stunde"),
    ("%n hours", "%n Stunden"),
    ("%n day", "%n Tag"),
    ("%n days", "%n Tagen"),
];

const FR: &[(&str, &str)] = &[
    ("Don't forget to go to %s", "N'oubliez pas : %s"),
    ("When:", "Quand :"),
    ("Where:", "Où :"),
    ("Description:", "Description :"),
    ("Link:", "Lien :"),
    ("Untitled event", "Événement sans titre"),
    ("Your event \"%s\" is in %s", "Votre événement « %s » commence dans %s"),
    ("Your event \"%s\" has started", "Votre événement « %s » a commencé"),
    ("%n minute", "%n minute"),
    ("%n minutes", "%n minutes"),
    ("%n hour", "%n heure"),
    ("%n hours", "%n heures"),
    ("%n day", "%n jour"),
    ("%n days", "%n jours"),
];

impl StaticCatalog {
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        tables.insert("de", DE.iter().copied().collect());
        tables.insert("fr", FR.iter().copied().collect());
        Self { tables }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl IStringCatalog for StaticCatalog {
    fn translate(&self, language: &str, key: &str) -> Option<String> {
        self.tables
            .get(language)
            .and_then(|table| table.get(key))
            .map(|s| s.to_string())
    }
}
