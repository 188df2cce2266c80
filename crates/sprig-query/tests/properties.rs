use core::cell::Cell;
use core::cell::RefCell;
use sprig_core::ErrorKind;
use sprig_dom::Namespace;
use sprig_query::Built;
use sprig_query::ClassMode;
use sprig_query::Dom;
use sprig_query::Event;
use sprig_query::Query;
use sprig_query::StyleInput;
use sprig_query::StyleValue;
use sprig_query::select;
use std::rc::Rc;

#[test]
fn compound_selector_builds_one_element() {
    let dom = Dom::new();
    let before = dom.read(|document| document.node_count());
    let built = match dom.build("div.card#x") {
        Ok(built) => built,
        Err(error) => panic!("{error}"),
    };

    assert_eq!(dom.read(|document| document.node_count()), before + 1);
    assert_eq!(built.attr("id").as_deref(), Some("x"));
    assert!(built.has_class("card"));
    assert_eq!(built.html(), "");
    let tag = dom.read(|document| {
        document
            .element(built.first_node())
            .map(|element| element.tag_name().to_owned())
    });
    assert_eq!(tag, Some("div".to_owned()));
}

#[test]
fn nested_build_is_idempotent() {
    let dom = Dom::new();
    let first = dom.read(|document| document.node_count());
    if let Err(error) = dom.build("ul li.item") {
        panic!("{error}");
    }
    let second = dom.read(|document| document.node_count());
    if let Err(error) = dom.build("ul li.item") {
        panic!("{error}");
    }
    let third = dom.read(|document| document.node_count());

    assert_eq!(second - first, 2);
    assert_eq!(third, second);
}

#[test]
fn svg_names_select_the_svg_namespace() {
    let dom = Dom::new();
    let tags = [
        "svg", "circle", "ellipse", "line", "path", "polyline", "polygon", "rect", "div", "g",
    ];
    for tag in tags {
        let built = match dom.build(&format!("{tag}.kind-{tag}")) {
            Ok(built) => built,
            Err(error) => panic!("{error}"),
        };
        let namespace = dom.read(|document| {
            document
                .element(built.first_node())
                .map(|element| element.namespace())
        });
        let expected = if sprig_query::SVG_TAGS.contains(&tag) {
            Namespace::Svg
        } else {
            Namespace::Html
        };
        assert_eq!(namespace, Some(expected), "<{tag}>");
    }
}

#[test]
fn style_set_respects_the_unitless_whitelist() {
    let dom = Dom::new();
    let Ok(panel) = dom.build("section.panel") else {
        panic!("build failed");
    };
    panel.set_css([("opacity", StyleInput::from(0.5)), ("width", StyleInput::from(10))]);

    assert_eq!(panel.css("opacity"), StyleValue::Raw("0.5".to_owned()));
    assert_eq!(panel.css("width"), StyleValue::Px(10.0));
    assert_eq!(panel.css("width").as_px(), Some(10.0));
}

#[test]
fn tap_sequence_fires_once() {
    let dom = Dom::new();
    let Ok(button) = dom.build("button.go") else {
        panic!("build failed");
    };
    let taps = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&taps);
    button.on_tap(move |_, _| counter.set(counter.get() + 1));
    let node = button.first_node();

    dom.dispatch(node, &mut Event::touch_start(10.0, 10.0));
    dom.dispatch(node, &mut Event::touch_end(12.0, 11.0));
    dom.dispatch(node, &mut Event::click());
    assert_eq!(taps.get(), 1);

    dom.dispatch(node, &mut Event::touch_start(10.0, 10.0));
    dom.dispatch(node, &mut Event::touch_end(50.0, 50.0));
    assert_eq!(taps.get(), 1);
}

#[test]
fn three_matches_fan_out_in_document_order() {
    let dom = Dom::parse_html("<p>a</p><div><p>b</p></div><p>c</p>");
    let paragraphs = match select(&dom, "p") {
        Ok(paragraphs) => paragraphs,
        Err(error) => panic!("{error}"),
    };
    assert_eq!(paragraphs.len(), 3);

    paragraphs.class(ClassMode::Add, "x");
    let mut order = Vec::new();
    paragraphs.each(|paragraph, index| {
        assert!(paragraph.has_class("x"));
        order.push((index, paragraph.text()));
    });
    assert_eq!(order, [(0, "a".to_owned()), (1, "b".to_owned()), (2, "c".to_owned())]);
}

#[test]
fn zero_matches_is_an_error() {
    let dom = Dom::new();
    let result = dom.select("article.missing");
    assert!(result.is_err_and(|error| error.is(ErrorKind::NoMatchFound)));
}

#[test]
fn all_query_shapes_share_one_interface() {
    let dom = Dom::parse_html("<main><span>1</span><span>2</span></main>");
    let Ok(root) = dom.select(Query::Document) else {
        panic!("no document element");
    };
    let Ok(spans) = dom.select("span") else {
        panic!("no spans");
    };
    let Ok(one) = dom.select(spans.first_node()) else {
        panic!("node lookup failed");
    };

    for selection in [&root, &spans, &one] {
        selection.add_class("seen").set_attr("data-ok", "1");
    }

    assert!(root.has_class("seen"));
    assert_eq!(dom.select("span.seen[data-ok]").map(|found| found.len()).ok(), Some(2));
    assert_eq!(one, spans.first());
}

#[test]
fn append_builds_under_each_element_and_runs_callback() {
    let dom = Dom::parse_html("<ul class=a></ul><ul class=b></ul>");
    let Ok(lists) = dom.select("ul") else {
        panic!("no lists");
    };
    let built = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&built);

    let appended = lists.append_with(
        "li.item",
        Built::callback(move |item| {
            counter.set(counter.get() + 1);
            item.set_attr("role", "listitem");
        }),
    );
    if let Err(error) = appended {
        panic!("{error}");
    }

    assert_eq!(built.get(), 2);
    assert_eq!(dom.select("ul > li.item[role=listitem]").map(|found| found.len()).ok(), Some(2));
    assert!(lists.append("<b>x</b>").is_ok());
    assert_eq!(dom.select("ul > b").map(|found| found.len()).ok(), Some(2));
}

#[test]
fn on_binds_every_listed_event() {
    let dom = Dom::new();
    let Ok(input) = dom.build("input#name") else {
        panic!("build failed");
    };
    let hits = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&hits);
    input.on("focus  blur", move |receiver, event| {
        assert_eq!(event.current_target(), Some(receiver.first_node()));
        counter.set(counter.get() + 1);
    });

    input.trigger("focus").trigger("blur").trigger("change");
    assert_eq!(hits.get(), 2);
}

#[test]
fn invalid_lookup_syntax_surfaces() {
    let dom = Dom::new();
    assert!(dom.select("p[").is_err_and(|error| error.is(ErrorKind::SelectorSyntax)));
    assert!(dom.build("  ").is_err_and(|error| error.is(ErrorKind::EmptySelector)));
}

fn count(dom: &Dom, selector: &str) -> usize {
    dom.select(selector).map_or(0, |found| found.len())
}

#[test]
fn build_reuses_skeleton_and_head_nodes() {
    let dom = Dom::parse_html(
        "<html><head><title>t</title></head><body><p>x</p></body></html>",
    );
    let before = dom.read(|document| document.node_count());

    let Ok(paragraph) = dom.build("body p") else {
        panic!("build failed");
    };
    assert_eq!(paragraph.text(), "x");

    let Ok(title) = dom.build("title") else {
        panic!("build failed");
    };
    assert_eq!(title.text(), "t");

    assert_eq!(dom.read(|document| document.node_count()), before);
    assert_eq!(count(&dom, "body"), 1);
    assert_eq!(count(&dom, "title"), 1);
}

#[test]
fn reads_on_many_elements_use_the_first() {
    let dom = Dom::parse_html(
        r#"<i class="one" style="width: 3px"></i><i class="two" style="width: 7px"></i>"#,
    );
    let Ok(items) = dom.select("i") else {
        panic!("no items");
    };

    assert_eq!(items.len(), 2);
    assert_eq!(items.css("width"), StyleValue::Px(3.0));
    assert_eq!(items.attr("class").as_deref(), Some("one"));
    assert!(items.has_class("one"));
    assert!(!items.has_class("two"));
}

#[test]
fn tap_state_is_private_to_each_element() {
    let dom = Dom::parse_html("<button id=a></button><button id=b></button>");
    let Ok(buttons) = dom.select("button") else {
        panic!("no buttons");
    };
    let taps = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&taps);
    buttons.on_tap(move |receiver, _| log.borrow_mut().push(receiver.attr("id")));

    let (Some(first), Some(second)) = (buttons.node(0), buttons.node(1)) else {
        panic!("expected two buttons");
    };
    dom.dispatch(first, &mut Event::touch_start(10.0, 10.0));
    dom.dispatch(second, &mut Event::click());

    assert_eq!(*taps.borrow(), [Some("b".to_owned())]);
}
