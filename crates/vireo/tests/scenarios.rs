//! End-to-end behaviour of the diff, merge and reconciliation pipeline.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use vireo::prelude::*;
use vireo::{FrameScheduler, ReconcileError, TimerScheduler};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

// ---------------------------------------------------------------------------
// Diff and merge
// ---------------------------------------------------------------------------

#[test]
fn equal_values_never_diff() {
    for sample in [
        json!(null),
        json!(0),
        json!("text"),
        json!([]),
        json!({}),
        json!([1, [2, [3]], {"a": null}]),
        json!({"rows": [{"id": 1, "tags": ["x"]}], "meta": {"page": 2}}),
    ] {
        assert_eq!(diff(&v(sample.clone()), &v(sample)), None);
    }
}

#[test]
fn successive_sets_compose_into_one_delta() {
    let mut widget = Widget::new("w", [("a", 1), ("b", 2)], vireo::Plain).unwrap();
    let deltas = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deltas);
    widget.on("change", move |event| sink.borrow_mut().push(event.data.clone()));

    let s0 = widget.state().deep_clone();
    widget.set([("a", Value::from(2)), ("b", Value::Undefined), ("c", Value::from(3))]).unwrap();
    let s1 = widget.state().deep_clone();
    widget.set([("a", 1), ("c", 4), ("d", 5)]).unwrap();
    let s2 = widget.state().deep_clone();
    assert_eq!(deltas.borrow().len(), 2);

    let first = diff(&s0, &s1);
    let second = diff(&s1, &s2);
    let merged = merge(first.as_ref(), second.as_ref()).unwrap();
    assert_eq!(Some(merged), diff(&s0, &s2));
}

#[test]
fn no_op_deltas_merge_to_nothing() {
    let delta = diff(&v(json!({"a": 1})), &v(json!({"a": 2})));
    assert_eq!(merge(delta.as_ref(), None), delta);
    assert_eq!(merge(None, delta.as_ref()), delta);

    let weird = [
        None,
        Some(Delta::new()),
        Some(Delta::single("a", Entry::Settled)),
        Some(Delta::single("a", Change::new(Value::Undefined, Value::Undefined))),
        Some(Delta::single("a", Entry::Opaque(Value::from(0)))),
        Some(Delta::single("a", Entry::Opaque(Value::from("")))),
    ];
    for x in &weird {
        for y in &weird {
            assert_eq!(merge(x.as_ref(), y.as_ref()), None, "{x:?} + {y:?}");
        }
    }
}

#[test]
fn self_referential_states_terminate() {
    let make = |label: &str| {
        let node = v(json!({"label": label}));
        node.as_object().unwrap().insert("me", node.clone());
        node
    };
    assert_eq!(diff(&make("x"), &make("x")), None);

    let delta = diff(&make("x"), &make("y")).unwrap();
    assert_eq!(delta.len(), 1);
    assert!(delta.contains("label"));
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

fn keyed_group(data: serde_json::Value) -> Group<ObjectViews> {
    Group::new(
        "keyed",
        [("data", v(data))],
        ObjectViews,
        GroupConfig::synchronous().with_key(KeyPolicy::by_id()),
    )
    .unwrap()
}

#[test]
fn create_appends_a_keyed_view() {
    let group = keyed_group(json!([{"id": 1}, {"id": 2}]));
    assert_eq!(group.views().len(), 2);

    let rows = group.get("data").as_array().unwrap().borrow().clone();
    let mut next = rows;
    next.push(v(json!({"id": 3})));
    group.set([("data", Value::from(next))]).unwrap();

    let views = group.views();
    assert_eq!(views.len(), 3);
    assert_eq!(views[2], v(json!({"id": 3})));
}

#[test]
fn remove_leaves_one_pair_and_no_stale_views() {
    let group = keyed_group(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
    let first = group.get("data.0");
    group.set([("data", Value::array([first]))]).unwrap();

    let views = group.views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0], v(json!({"id": 1})));
    assert_eq!(group.view_slots().len(), 1);
}

#[test]
fn large_change_drains_one_row_per_call() {
    let queue = TaskQueue::new();
    let config = GroupConfig {
        large_change: 0,
        drain_growth: 0,
        ..GroupConfig::default()
    }
    .with_drain_method(queue.clone());
    let group = Group::new("async", [("data", Value::empty_array())], ObjectViews, config).unwrap();

    let renders = Rc::new(Cell::new(0));
    let seen = Rc::clone(&renders);
    group.on("render", move |_| seen.set(seen.get() + 1));

    group.set([("data", v(json!([{"n": 1}, {"n": 2}, {"n": 3}])))]).unwrap();
    assert_eq!(group.views().len(), 0);
    assert_eq!(renders.get(), 0);

    assert_eq!(group.drain().unwrap(), Drain::Stepped);
    assert_eq!(group.views().len(), 1);
    assert_eq!(group.drain().unwrap(), Drain::Stepped);
    assert_eq!(group.views().len(), 2);
    assert_eq!(renders.get(), 0);
    assert_eq!(group.drain().unwrap(), Drain::Finished);
    assert_eq!(group.views().len(), 3);
    assert_eq!(renders.get(), 1);

    // The continuation scheduled by `set` finds nothing left to do.
    assert_eq!(queue.run_until_idle(), 1);
    assert_eq!(renders.get(), 1);
    assert_eq!(group.drain().unwrap(), Drain::Idle);
}

#[test]
fn out_of_range_entries_are_ignored() {
    let group = keyed_group(json!([{"id": 1}]));
    group.enqueue_entry(7, Entry::pair(Value::Undefined, Value::from(1)));
    group.enqueue_entry(9, Entry::pair(v(json!({"id": 9})), Value::Undefined));

    assert_eq!(group.drain().unwrap(), Drain::Stepped);
    assert_eq!(group.drain().unwrap(), Drain::Finished);
    assert_eq!(group.views(), vec![v(json!({"id": 1}))]);
    assert_eq!(group.get("data").len(), 1);
}

#[test]
fn malformed_entries_are_fatal() {
    let group = keyed_group(json!([{"id": 1}]));
    group.enqueue_entry(0, Entry::Opaque(Value::from(-1)));

    match group.drain() {
        Err(ReconcileError::UnknownDelta { index, value }) => {
            assert_eq!(index, 0);
            assert_eq!(value, Value::from(-1));
        }
        other => panic!("expected an unknown delta, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Element-backed lists
// ---------------------------------------------------------------------------

#[test]
fn list_renders_into_the_container() {
    let ul = Node::new("ul").with_id("my-list").with_child(Node::new("li"));
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&events);
    let list = ListBuilder::new("my-list", ul.clone())
        .config(GroupConfig::synchronous())
        .on("*", move |event| log.borrow_mut().push(event.kind.clone()))
        .build([("data", Value::array([1, 2, 3]))])
        .unwrap();

    assert_eq!(ul.to_html(), r#"<ul id="my-list"><li>1</li><li>2</li><li>3</li></ul>"#);
    assert_eq!(
        *events.borrow(),
        ["init", "create", "create", "create", "render"]
    );

    events.borrow_mut().clear();
    list.set([("data", Value::array([1, 5]))]).unwrap();
    assert_eq!(ul.text(), "15");
    assert_eq!(*events.borrow(), ["change", "update", "remove", "render"]);
}

#[test]
fn list_builder_rejects_bad_input() {
    let ul = Node::new("ul");
    assert!(matches!(
        ListBuilder::new("bad", ul.clone()).selector("ul > li"),
        Err(VireoError::Dom(_))
    ));
    assert!(matches!(
        ListBuilder::new("bad", ul).config_toml("large_change = -1"),
        Err(VireoError::Config(_))
    ));
}

#[test]
fn list_spreads_large_changes_over_frames() {
    let frames = FrameScheduler::new();
    let ul = Node::new("ul").with_child(Node::new("li"));
    let renders = Rc::new(Cell::new(0));
    let seen = Rc::clone(&renders);
    let list = ListBuilder::new("frames", ul.clone())
        .config(GroupConfig::default().with_drain_method(frames.clone()))
        .config_toml("large_change = 2\ndrain_growth = 1")
        .unwrap()
        .on("render", move |_| seen.set(seen.get() + 1))
        .build(Vec::<(&str, Value)>::new())
        .unwrap();
    assert_eq!(renders.get(), 1);

    list.set([("data", Value::array(["a", "b", "c", "d", "e"]))]).unwrap();
    assert_eq!(ul.children().len(), 0);

    let mut ticks = 0;
    while !frames.is_empty() {
        frames.tick();
        ticks += 1;
        assert_eq!(ul.children().len(), ticks);
    }
    assert_eq!(ticks, 5);
    assert_eq!(ul.text(), "abcde");
    assert_eq!(renders.get(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn list_drains_on_a_local_timer() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ul = Node::new("ul").with_child(Node::new("li"));
            let config = GroupConfig {
                large_change: 1,
                delay_ms: 1,
                ..GroupConfig::default()
            }
            .with_drain_method(TimerScheduler);
            let list = ListBuilder::new("timer", ul.clone())
                .config(config)
                .build(Vec::<(&str, Value)>::new())
                .unwrap();

            list.set([("data", Value::array((0..8).map(Value::from)))]).unwrap();
            assert!(ul.children().is_empty());

            for _ in 0..100 {
                if list.pending_len() == 0 && list.in_flight() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert_eq!(ul.text(), "01234567");
            assert_eq!(list.in_flight(), 0);
        })
        .await;
}

#[test]
fn dotted_properties_create_intermediates() {
    let widget = Widget::new("stats", [("stats.count", 42)], vireo::Plain).unwrap();
    assert_eq!(widget.get("stats").unwrap(), v(json!({"count": 42})));
    assert_eq!(widget.get("stats.count").unwrap(), Value::from(42));
}
