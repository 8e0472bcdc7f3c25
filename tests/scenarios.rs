//! End-to-end behaviour of the scanner and extractors on small pages.

use pretty_assertions::assert_eq;
use rstest::rstest;

use wikiscan::wikitext::{
    Layout, SpanKind, TemplateArguments, WikiText,
    scanner::scan,
    search::find_next,
    types::{
        links::{ExternalLink, WikiLink, external_links, inner_links},
        table::{self, Row},
        templates::{build, find_all, parse_arguments},
    },
};

#[rstest]
#[case::plain("hello {{t|x}}", "t", vec!["{{t|x}}"])]
#[case::outer_not_partial("{{t|{{x|a}}{{y}}|z}}", "t", vec!["{{t|{{x|a}}{{y}}|z}}"])]
#[case::unclosed("{{t|unterminated", "t", vec![])]
#[case::several("{{t|1}}\n{{t\n|2}}", "t", vec!["{{t|1}}", "{{t\n|2}}"])]
#[case::inside_other_template("{{box|{{t|in}}}}", "t", vec!["{{t|in}}"])]
#[case::commented_out("<!-- {{t|x}} -->", "t", vec![])]
fn finds_template_invocations(
    #[case] text: &str,
    #[case] name: &str,
    #[case] expected: Vec<&str>,
) {
    assert_eq!(find_all(text, name), expected);
}

#[test]
fn simple_table() {
    let tables = table::parse("{| class=\"w\"\n! H1 !! H2\n|-\n| D1 || D2\n|}");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].style, "class=\"w\"");
    assert_eq!(
        tables[0].rows,
        vec![Row::header(["H1", "H2"]), Row::data(["D1", "D2"])]
    );
}

#[test]
fn internal_links() {
    assert_eq!(
        inner_links("[[A|B]] [[C]]"),
        vec![WikiLink::new("A", "B"), WikiLink::new("C", "C")]
    );
}

#[test]
fn external_link_with_label() {
    assert_eq!(
        external_links("[http://x.com label]"),
        vec![ExternalLink::new("http://x.com", "label")]
    );
}

#[test]
fn nested_separator_protection() {
    let args = parse_arguments("{{T|{{x|a|b}}|c}}", false);
    assert_eq!(
        args,
        TemplateArguments::from_parts(["{{x|a|b}}", "c"], Vec::<(String, String)>::new())
    );
}

#[rstest]
#[case::positional_only(TemplateArguments::from_parts(["a", "b", "c"], Vec::<(String, String)>::new()))]
#[case::named_only(TemplateArguments::from_parts(Vec::<String>::new(), [("name", "Tower"), ("area", "Ring 1")]))]
#[case::mixed(TemplateArguments::from_parts(["[[Link|text]]", "{{inner|k=v}}"], [("difficulty", "2.5")]))]
#[case::value_with_equals(TemplateArguments::from_parts(["a=b", "c"], [("k", "x=y")]))]
#[case::empty(TemplateArguments::new())]
#[case::numeric_named(TemplateArguments::from_parts(["a"], [("3", "c"), ("k", "v")]))]
#[case::oversized_index(TemplateArguments::from_parts(["a"], [("18446744073709551615", "x")]))]
fn build_then_parse_round_trips(
    #[case] args: TemplateArguments,
    #[values(Layout::Compact, Layout::Multiline)] layout: Layout,
) {
    let text = build(&args, "T", layout);
    assert_eq!(parse_arguments(&text, false), args);
}

#[test]
fn numeric_named_key_lands_in_position() {
    let mut args = TemplateArguments::new();
    args.set_named("2", "x");
    assert_eq!(args.get(2), Some("x"));
    assert!(args.named().is_empty());
    let text = build(&args, "T", Layout::Compact);
    assert_eq!(text, "{{T|2=x}}");
    assert_eq!(parse_arguments(&text, false), args);
}

#[rstest]
#[case::u64_max("{{T|18446744073709551615=x}}")]
#[case::four_billion("{{T|4000000000=x}}")]
fn huge_numeric_keys_do_not_expand_positions(#[case] text: &str) {
    let args = parse_arguments(text, false);
    assert!(args.positional().is_empty());
    assert_eq!(args.named().len(), 1);
    assert_eq!(WikiText::new(text).template_arguments("T", false), vec![args]);
}

#[test]
fn round_trip_with_gaps() {
    let mut args = TemplateArguments::new();
    args.set_positional(2, "b").unwrap();
    args.set_positional(5, "e").unwrap();
    args.set_named("k", "v");
    let text = build(&args, "T", Layout::Compact);
    assert_eq!(text, "{{T|2=b|5=e|k=v}}");
    assert_eq!(parse_arguments(&text, false), args);
}

#[rstest]
#[case::template("{{a}}", vec![(SpanKind::Template, "{{a}}")])]
#[case::parameter("{{{1}}}", vec![(SpanKind::Parameter, "{{{1}}}")])]
#[case::brace("{a}", vec![(SpanKind::Brace, "{a}")])]
#[case::wiki_link("[[a|b]]", vec![(SpanKind::WikiLink, "[[a|b]]")])]
#[case::link("[http://a b]", vec![(SpanKind::Link, "[http://a b]")])]
#[case::nested_templates(
    "x{{a{{b}}c}}",
    vec![(SpanKind::Template, "{{a{{b}}c}}"), (SpanKind::Template, "{{b}}")]
)]
#[case::sequential_links(
    "[[a]] [[b]]",
    vec![(SpanKind::WikiLink, "[[a]]"), (SpanKind::WikiLink, "[[b]]")]
)]
#[case::unmatched_close("a}} [[b]]", vec![(SpanKind::WikiLink, "[[b]]")])]
fn single_family_delimiters_balance(#[case] text: &str, #[case] expected: Vec<(SpanKind, &str)>) {
    let found: Vec<_> = scan(text, 0)
        .into_iter()
        .map(|s| (s.kind, s.slice(text)))
        .collect();
    assert_eq!(found, expected);
}

#[rstest]
#[case::nowiki("<nowiki>{{not a template}}</nowiki>", SpanKind::Escape)]
#[case::nowiki_upper("<NOWIKI>[[x]] {{y}}</NOWIKI>", SpanKind::Escape)]
#[case::comment("<!-- {{t|a}} [[b]] [c d] -->", SpanKind::Comment)]
fn opaque_regions_hide_their_content(#[case] text: &str, #[case] kind: SpanKind) {
    let spans = scan(text, 0);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].kind, kind);
    assert_eq!(spans[0].slice(text), text);
    for target in ["{{", "[[", "|", "}}", "="] {
        assert_eq!(find_next(text, 0, target, true), None, "{}", target);
        assert_eq!(find_next(text, 0, target, false), None, "{}", target);
    }
}

#[test]
fn page_facade() {
    let page = WikiText::new(
        "{{Infobox tower|name=Tower of Annoyingly Simple Trials|difficulty=1}}\n\
         '''ToAST''' is in [[Ring 1]].\n\
         {| class=\"wikitable\"\n! Floor !! Difficulty\n|-\n| 1 || Effortless\n|}\n\
         [https://jtoh.fandom.com Wiki]",
    );
    let args = page.template_arguments("Infobox tower", false);
    assert_eq!(args[0].named_arg("difficulty").unwrap(), "1");
    assert_eq!(page.inner_links(), vec![WikiLink::new("Ring 1", "Ring 1")]);
    assert_eq!(page.tables()[0].column("Difficulty").unwrap(), vec!["Effortless"]);
    assert_eq!(
        page.external_links()[0].parsed_url().map(|u| u.to_string()),
        Some("https://jtoh.fandom.com/".to_string())
    );
}
