// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated listeners over a small document.
//!
//! This example shows:
//! - one delegated `click` listener on a list serving every item, present and future,
//! - removed items and comment nodes never receiving dispatch,
//! - namespaced toolbar listeners removed in bulk with `.off(".toolbar")`,
//! - native `focus` moving focus in the tree before listeners run, unless the input
//!   is disabled,
//! - readiness callbacks, including one that fails without affecting the others.
//!
//! Run:
//! - `RUST_LOG=understory_delegate=trace cargo run -p understory_demos --example delegated_clicks`

use std::cell::RefCell;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use understory_delegate::adapters::dom_tree::select;
use understory_delegate::{Events, Handler, Listen, Outcome};
use understory_dom_tree::{ElementData, NodeFlags, NodeId, NodeKind, Tree};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("understory_delegate=debug".parse()?),
        )
        .init();

    let mut tree = Tree::new();
    let body = tree.insert_element(tree.document(), ElementData::new("body"));
    let toolbar = tree.insert_element(body, ElementData::new("nav").with_class("toolbar"));
    let save = tree.insert_element(toolbar, ElementData::new("button").with_id("save"));
    let list = tree.insert_element(body, ElementData::new("ul").with_id("todos"));
    for label in ["milk", "eggs"] {
        let item = tree.insert_element(list, ElementData::new("li").with_class("todo"));
        tree.insert_text(item, label);
    }
    let search = tree.insert_element(
        body,
        ElementData::new("input")
            .with_attribute("type", "search")
            .focusable(),
    );

    let events: Events<NodeId, &'static str> = Events::new();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    // Queue work for when the host reports the document ready.
    {
        let log = log.clone();
        events.ready(move |_| {
            log.borrow_mut().push("ready: first".into());
            Ok(())
        });
    }
    events.ready(|_| Err("plugin failed to load".into()));

    // One delegated listener on the list handles clicks on any `li.todo`.
    let on_todo: Handler<NodeId, &'static str> = {
        let log = log.clone();
        Handler::new(move |ev| {
            log.borrow_mut().push(format!(
                "todo {:?} clicked (target {:?}, via {:?})",
                ev.current_target(),
                ev.target(),
                ev.delegate_target()
            ));
            Outcome::Stop
        })
    };
    let todos = select(&events, &tree, "#todos")?;
    todos.on_with("click", Listen::new().delegate("li.todo"), Some(&on_todo));

    // A body-level listener only sees clicks nobody stopped.
    let on_body: Handler<NodeId, &'static str> = {
        let log = log.clone();
        Handler::observe(move |ev| {
            let data = ev.data().copied().unwrap_or("-");
            log.borrow_mut().push(format!("body saw {} (data {data})", ev.name()));
        })
    };
    select(&events, &tree, "body")?.on("click", Some(&on_body));

    // Namespaced toolbar listeners with bound data.
    let on_save: Handler<NodeId, &'static str> = {
        let log = log.clone();
        Handler::observe(move |ev| {
            log.borrow_mut().push(format!(
                "save [{}] data={:?}",
                ev.listener_namespace(),
                ev.data()
            ));
        })
    };
    let buttons = select(&events, &tree, ".toolbar > button")?;
    let draft = Listen::new().data("draft");
    buttons.on_with("click.toolbar.save", draft, Some(&on_save));

    // Focus listener; the native triggerer moves focus first.
    let on_focus: Handler<NodeId, &'static str> = {
        let log = log.clone();
        Handler::observe(move |ev| {
            log.borrow_mut().push(format!("focused {:?}", ev.target()));
        })
    };
    events.select(&tree, [search]).one("focus", Some(&on_focus));

    let report = events.signal_ready();
    tracing::info!(
        invoked = report.invoked,
        failed = report.failures.len(),
        "ready callbacks drained"
    );

    for &item in tree.children_of(list) {
        let stopped_at = events.dispatch(&tree, item, "click", None);
        tracing::info!(?item, ?stopped_at, "clicked todo");
    }

    // Items added after the listener was attached are served by it too. The
    // comment node and the removed item receive nothing.
    let late = tree.create(NodeKind::Element(ElementData::new("li").with_class("todo")));
    tree.append(list, late);
    tree.insert_comment(list, "end of list");
    if let Some(&first) = tree.children_of(list).first() {
        tree.remove(first);
        let stopped_at = events.dispatch(&tree, first, "click", None);
        tracing::info!(item = ?first, ?stopped_at, "clicked removed todo");
    }
    for &node in tree.children_of(list) {
        let stopped_at = events.dispatch(&tree, node, "click", None);
        tracing::info!(?node, ?stopped_at, "clicked list child");
    }
    events.dispatch(&tree, save, "click", Some(&"from-trigger"));
    select(&events, &tree, "#save")?.off(".toolbar").trigger("click");

    events.select(&tree, [search]).trigger("focus").trigger("focus");
    println!("focus is on {:?}", tree.focused());

    // A disabled input refuses native focus; engine listeners still run.
    events.select(&tree, [search]).trigger("blur");
    if let Some(input) = tree.element_mut(search) {
        input.flags |= NodeFlags::DISABLED;
    }
    let search_box = events.select(&tree, [search]);
    search_box.on("focus", Some(&on_focus)).trigger("focus");
    println!("after disabling, focus is on {:?}", tree.focused());

    for line in log.borrow().iter() {
        println!("{line}");
    }
    Ok(())
}
