// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end walkthrough of the dwell engine over an in-memory page.
//!
//! The page has a navigation bar with a submenu, a button, a text field and a
//! scrolled-off link. A scripted host replays JSON messages against a fake
//! clock, arms the engine's deadline timer, and prints every outbound message.
//!
//! Run:
//! - `cargo run -p dwell_demos --example dwell_walkthrough`
//! - `RUST_LOG=dwell_engine=trace cargo run -p dwell_demos --example dwell_walkthrough`

use dwell_engine::document::MemNodeId;
use dwell_engine::{ChangeSource, Document, Engine, EngineConfig, Inbound, MemoryDocument};
use kurbo::{Rect, Size};
use tracing_subscriber::EnvFilter;

fn page() -> MemoryDocument {
    let mut doc = MemoryDocument::new(Size::new(800.0, 600.0), Size::new(800.0, 1600.0));
    let body = doc.root();

    let nav = doc.append(body, "nav", Rect::new(0.0, 0.0, 800.0, 48.0));
    doc.set_attribute(nav, "aria-label", "Main");
    let menu = doc.append(nav, "ul", Rect::new(16.0, 8.0, 216.0, 40.0));
    doc.set_attribute(menu, "role", "menu");
    doc.set_attribute(menu, "aria-label", "Products");
    for (i, name) in ["Boards", "Cables"].iter().enumerate() {
        let x = 16.0 + 100.0 * i as f64;
        let item = doc.append(menu, "a", Rect::new(x, 8.0, x + 100.0, 40.0));
        doc.set_attribute(item, "href", &format!("/{}", name.to_lowercase()));
        doc.set_text(item, name);
    }

    let send = doc.append(body, "button", Rect::new(100.0, 200.0, 180.0, 230.0));
    doc.set_text(send, "Send");
    let field = doc.append(body, "input", Rect::new(100.0, 300.0, 400.0, 330.0));
    doc.set_attribute(field, "placeholder", "Search");

    let footer = doc.append(body, "a", Rect::new(100.0, 1200.0, 200.0, 1220.0));
    doc.set_attribute(footer, "href", "/about");
    doc.set_text(footer, "About");
    doc
}

/// Feed one message and everything that comes due up to `until`.
fn step(
    engine: &mut Engine<MemNodeId>,
    doc: &MemoryDocument,
    at: u64,
    json: &str,
    until: u64,
) {
    match engine.handle_json(doc, json, at) {
        Ok(out) => print(at, &out),
        Err(err) => println!("{at:>5} ms  ! {err}"),
    }
    while let Some(deadline) = engine.next_deadline() {
        if deadline > until {
            break;
        }
        let out = engine.tick(doc, deadline);
        print(deadline, &out);
    }
}

fn print(at: u64, out: &[dwell_engine::Outbound]) {
    for msg in out {
        match msg.encode() {
            Ok(json) => println!("{at:>5} ms  > {json}"),
            Err(err) => println!("{at:>5} ms  ! {err}"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = page();
    let mut engine = match Engine::new(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            return;
        }
    };
    engine.observe(&mut doc);

    println!("-- index the page");
    step(&mut engine, &doc, 0, r#"{"type":"rebuild-requested"}"#, 0);

    println!("-- dwell on the button until it clicks");
    for t in (100..=1000).step_by(100) {
        step(
            &mut engine,
            &doc,
            t,
            r#"{"type":"pointer-sample","x":141,"y":214}"#,
            t + 99,
        );
    }

    println!("-- glance at the text field, then look away");
    step(&mut engine, &doc, 1100, r#"{"type":"pointer-sample","x":250,"y":315}"#, 1499);
    step(&mut engine, &doc, 1500, r#"{"type":"pointer-sample","x":600,"y":500}"#, 2500);

    println!("-- approach the menu: dock, then undock");
    step(&mut engine, &doc, 2600, r#"{"type":"pointer-sample","x":100,"y":30}"#, 2600);
    step(&mut engine, &doc, 2700, r#"{"type":"pointer-sample","x":140,"y":214}"#, 2700);
    step(&mut engine, &doc, 2800, r#"{"type":"undock"}"#, 2800);

    println!("-- a switch press confirms without waiting");
    step(&mut engine, &doc, 2900, r#"{"type":"pointer-sample","x":141,"y":214}"#, 2900);
    step(&mut engine, &doc, 2950, r#"{"type":"activate"}"#, 2950);

    println!("-- hold the scroll-down control");
    step(
        &mut engine,
        &doc,
        3000,
        r#"{"type":"control-enter","surface":"toolbar","control":"scroll-down","repeating":true}"#,
        4600,
    );
    step(&mut engine, &doc, 4600, r#"{"type":"control-leave","surface":"toolbar"}"#, 4600);

    println!("-- scroll the footer into view");
    doc.scroll_to(0.0, 800.0);
    step(&mut engine, &doc, 4700, r#"{"type":"scroll-settled"}"#, 5000);
    step(&mut engine, &doc, 5000, r#"{"type":"pointer-sample","x":150,"y":410}"#, 5000);

    println!("-- the page edits itself");
    let body = doc.root();
    let banner = doc.append(body, "button", Rect::new(500.0, 900.0, 600.0, 930.0));
    doc.set_text(banner, "Dismiss");
    let records = doc.take_batch();
    let out = engine.handle(&doc, Inbound::DocumentMutated { records }, 5100);
    print(5100, &out);
    step(&mut engine, &doc, 5100, r#"{"type":"scroll-requested"}"#, 5400);

    println!("-- malformed input is reported, not fatal");
    step(&mut engine, &doc, 5500, r#"{"type":"warp-drive"}"#, 5500);

    tracing::info!(
        elements = engine.snapshot().elements().len(),
        visible = doc.viewport().document_rect().height(),
        "walkthrough finished"
    );
}
