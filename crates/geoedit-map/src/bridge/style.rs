//! Feature render styles.

use geoedit_core::FeatureId;
use geoedit_settings::StyleSettings;

/// Render style handed to the map engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub stroke: String,
    pub fill: String,
    pub stroke_width: f64,
    /// Marker radius for points, in pixels.
    pub point_radius: f64,
}

/// The two styles in use: default and selected.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    default: FeatureStyle,
    selected: FeatureStyle,
}

impl StyleSheet {
    pub fn from_settings(settings: &StyleSettings) -> Self {
        Self {
            default: FeatureStyle {
                stroke: settings.default_stroke.clone(),
                fill: settings.default_fill.clone(),
                stroke_width: settings.default_stroke_width,
                point_radius: settings.point_radius,
            },
            selected: FeatureStyle {
                stroke: settings.selected_stroke.clone(),
                fill: settings.selected_fill.clone(),
                stroke_width: settings.selected_stroke_width,
                point_radius: settings.point_radius,
            },
        }
    }

    pub fn default_style(&self) -> &FeatureStyle {
        &self.default
    }

    pub fn selected_style(&self) -> &FeatureStyle {
        &self.selected
    }

    /// Style of feature `id` given the current selection.
    pub fn style_for(&self, id: &FeatureId, selected: Option<&FeatureId>) -> &FeatureStyle {
        if selected == Some(id) {
            &self.selected
        } else {
            &self.default
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::from_settings(&StyleSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_selected_id_gets_selected_style() {
        let sheet = StyleSheet::default();
        let selected = FeatureId::Int(2);
        assert_eq!(
            sheet.style_for(&FeatureId::Int(2), Some(&selected)).stroke,
            "red"
        );
        assert_eq!(
            sheet.style_for(&FeatureId::Int(1), Some(&selected)).stroke,
            "blue"
        );
        assert_eq!(sheet.style_for(&FeatureId::Int(2), None).stroke_width, 2.0);
    }
}
