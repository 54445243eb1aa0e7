use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use egui::Vec2;
use std::collections::BTreeMap;

pub const BUILT_IN_FAMILIES: [&str; 8] = [
    "Inter",
    "Roboto",
    "Montserrat",
    "Lato",
    "Playfair Display",
    "Arial",
    "Times New Roman",
    "Courier New",
];

pub const DEFAULT_FAMILY: &str = "Inter";

/// Font families offered to text layers, with parsed faces for uploads.
///
/// Built-in families are names only; rasterizing them uses egui's bundled
/// default face.
pub struct FontLibrary {
    families: Vec<String>,
    uploaded: BTreeMap<String, FontArc>,
    fallback: Option<FontArc>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self {
            families: BUILT_IN_FAMILIES.iter().map(|f| f.to_string()).collect(),
            uploaded: BTreeMap::new(),
            fallback: bundled_font(),
        }
    }
}

impl FontLibrary {
    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Registers an uploaded font file and returns the family name it was
    /// filed under. Bytes that do not parse are still listed by name.
    pub fn add(&mut self, file_name: &str, bytes: Vec<u8>) -> String {
        let family = family_name(file_name);
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                self.uploaded.insert(family.clone(), font);
            }
            Err(e) => log::warn!("Font '{}' could not be parsed: {}", file_name, e),
        }
        if !self.families.contains(&family) {
            self.families.push(family.clone());
        }
        log::info!("Registered font family '{}'", family);
        family
    }

    pub fn is_uploaded(&self, family: &str) -> bool {
        self.uploaded.contains_key(family)
    }

    /// Face used to rasterize `family`.
    pub fn face(&self, family: &str) -> Option<&FontArc> {
        self.uploaded.get(family).or(self.fallback.as_ref())
    }

    /// Size of a single line of `text` at `size` px.
    pub fn measure(&self, family: &str, text: &str, size: f32) -> Vec2 {
        match self.face(family) {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                let mut width = 0.0;
                let mut prev = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                Vec2::new(width, scaled.height())
            }
            None => Vec2::new(text.chars().count() as f32 * size * 0.6, size * 1.2),
        }
    }
}

/// File name without its last extension.
pub fn family_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(i) if i > 0 => file_name[..i].to_string(),
        _ => file_name.to_string(),
    }
}

fn bundled_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let data = defs
        .font_data
        .get("Ubuntu-Light")
        .or_else(|| defs.font_data.values().next())?;
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Bundled font unavailable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_name() {
        assert_eq!(family_name("Brand-Bold.ttf"), "Brand-Bold");
        assert_eq!(family_name("archive.v2.otf"), "archive.v2");
        assert_eq!(family_name("noext"), "noext");
        assert_eq!(family_name(".hidden"), ".hidden");
    }

    #[test]
    fn test_built_ins_and_fallback_face() {
        let lib = FontLibrary::default();
        assert_eq!(lib.families().len(), 8);
        assert_eq!(lib.families()[0], DEFAULT_FAMILY);
        assert!(lib.face("Roboto").is_some());
    }

    #[test]
    fn test_measure_grows_with_text() {
        let lib = FontLibrary::default();
        let short = lib.measure(DEFAULT_FAMILY, "ab", 32.0);
        let long = lib.measure(DEFAULT_FAMILY, "abcdef", 32.0);
        assert!(long.x > short.x);
        assert!(short.y > 0.0);
        assert_eq!(lib.measure(DEFAULT_FAMILY, "", 32.0).x, 0.0);
    }

    #[test]
    fn test_unparseable_upload_is_listed() {
        let mut lib = FontLibrary::default();
        let family = lib.add("Broken.ttf", vec![0, 1, 2]);
        assert_eq!(family, "Broken");
        assert!(lib.families().contains(&"Broken".to_string()));
        assert!(!lib.is_uploaded("Broken"));
        // Falls back to the bundled face.
        assert!(lib.face("Broken").is_some());

        lib.add("Broken.ttf", vec![]);
        assert_eq!(lib.families().iter().filter(|f| *f == "Broken").count(), 1);
    }
}
