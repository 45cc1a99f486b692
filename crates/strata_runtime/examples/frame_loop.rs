//! Frame Loop Demo
//!
//! A toolbar whose button widens while hovered:
//! - a state animation grows the button width on `hovered`
//! - an update hook copies the width into the button's layout modifier
//! - the late update lays the toolbar out with the new width
//!
//! Run with: cargo run -p strata_runtime --example frame_loop

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use strata_animation::{AnimationHost, Property, PropertyKey, TargetId};
use strata_core::{tags, ComponentState, Size};
use strata_layout::{FlexController, LayoutModifier};
use strata_runtime::{init_logging, Runtime};

const CONFIG: &str = r#"
fixed_delta = 0.016
log_filter = "strata_layout=debug,info"

[default_animation]
duration = { seconds = 0.2 }
curve = "ease-out"
"#;

fn main() -> Result<()> {
    let mut runtime = Runtime::from_toml(CONFIG)?;
    init_logging(&runtime.config().log_filter)?;

    let layout = runtime.layout_mut();
    let toolbar = layout.create_driver(Some(FlexController::row().gap(8.0).padding(4.0).boxed()));
    layout.set_available_space(toolbar, Size::new(320.0, 48.0))?;
    let button = layout.create_item();
    let spacer = layout.create_item();
    layout.add_child(toolbar, button)?;
    layout.add_child(toolbar, spacer)?;
    layout.set_modifier(button, Some(LayoutModifier::new().w(64.0)))?;
    layout.set_modifier(spacer, Some(LayoutModifier::new().flex_1()))?;

    let width = Rc::new(Cell::new(64.0_f32));
    let property = Property::from_cell(PropertyKey::new(TargetId::unique(), "width"), width.clone());
    let hovered = ComponentState::from(tags::HOVERED);
    let grow = runtime.animation().animate(
        property.clone(),
        None,
        96.0,
        runtime.default_animation(),
    )?;
    let shrink = runtime
        .animation()
        .animate(property, None, 64.0, runtime.default_animation())?;

    let mut host = AnimationHost::with_states([hovered.clone()]);
    host.add_transition(hovered.clone(), grow)?;
    host.add_transition(ComponentState::default(), shrink)?;
    let host_id = runtime.add_host(host);

    let w = Rc::clone(&width);
    runtime.on_each_update(move |_, layout| {
        layout.set_modifier(button, Some(LayoutModifier::new().w(w.get())))?;
        Ok(())
    });

    for frame in 0..40 {
        match frame {
            5 => runtime.host_mut(host_id)?.set_state(hovered.clone()),
            25 => runtime.host_mut(host_id)?.set_state(ComponentState::default()),
            _ => {}
        }
        let stats = runtime.frame(0.016)?;
        let rect = runtime.layout().rect(button)?;
        tracing::info!(
            "frame {:>2}: button x={} w={:.1} passes={}",
            frame,
            rect.x(),
            rect.width(),
            stats.layout_passes
        );
    }

    Ok(())
}
