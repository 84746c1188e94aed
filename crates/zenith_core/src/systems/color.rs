//! `color` - an observable tint other systems can follow

use crate::ecs::{parse_options, Component, ComponentError, EntityRef, System, SystemState};
use crate::observable::Observable;
use crate::scene::Rgba;
use serde::Deserialize;
use serde_json::Value;

/// The color component. Writers go through `set`/`modify` so readers can
/// tell a change by the version.
pub type Color = Observable<Rgba>;

#[derive(Default, Deserialize)]
#[serde(default)]
struct ColorOptions {
    color: Option<String>,
}

#[derive(Debug, Default)]
pub struct ColorSystem;

impl System for ColorSystem {
    fn init(&mut self, state: &mut SystemState) {
        state.disable_updates();
    }

    fn create_component(
        &mut self,
        options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        let options: ColorOptions = parse_options(options)?;
        let color = match options.color {
            Some(hex) => Rgba::from_hex(&hex)
                .ok_or_else(|| ComponentError::rejected(format!("invalid color '{hex}'")))?,
            None => Rgba::WHITE,
        };
        Ok(Box::new(Color::new(color)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(options: Value) -> Result<Color, ComponentError> {
        let entity = EntityRef::new();
        let component = ColorSystem.create_component(&options, &entity)?;
        Ok(*component.downcast::<Color>().unwrap())
    }

    #[test]
    fn parses_hex_and_defaults_to_white() {
        assert_eq!(*create(json!({})).unwrap().get(), Rgba::WHITE);
        assert_eq!(
            *create(json!({ "color": "#00ff00" })).unwrap().get(),
            Rgba::new(0.0, 1.0, 0.0, 1.0)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            create(json!({ "color": "green" })),
            Err(ComponentError::Rejected { .. })
        ));
    }
}
