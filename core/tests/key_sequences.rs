use pretty_assertions::assert_eq;
use reel_core::input::BindingRegistry;
use reel_core::input::InputSection;
use reel_core::input::KeyResolver;
use reel_core::input::RegistrySettings;
use reel_core::input::conf_file::load_conf_file;
use reel_core::input::section_stack::EnableFlags;

const INPUT_CONF: &str = "\
default-bindings start
a set window-scale 1.0
b set window-scale 1.5
c set window-scale 2.0

d ignore
e ignore
f ignore
d-e-f set window-scale 1.8
d-d-e set window-scale 2.1
d-d-d-e set window-scale 2.2
d-d-d-d-e set window-scale 1.7

g ignore
h ignore
i ignore
g-h-i set window-scale 1.2
j seek -5
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Unbound,
    Ignored,
    Command(String),
}

fn registry() -> BindingRegistry {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("input.conf");
    std::fs::write(&path, INPUT_CONF).expect("write input.conf");
    let mappings = load_conf_file(&path, 1000).expect("load input.conf");

    let registry = BindingRegistry::with_default_precedence(RegistrySettings::default());
    registry.replace_user_conf(mappings).expect("replace conf");
    registry
}

fn press(resolver: &mut KeyResolver, registry: &BindingRegistry, keys: &[&str]) -> Vec<Outcome> {
    keys.iter()
        .map(|key| match resolver.resolve_key(key, &registry.current()) {
            None => Outcome::Unbound,
            Some(mapping) if mapping.is_ignored() => Outcome::Ignored,
            Some(mapping) => Outcome::Command(mapping.command_tokens().join(" ")),
        })
        .collect()
}

fn cmd(text: &str) -> Outcome {
    Outcome::Command(text.to_string())
}

#[test]
fn single_keys_fire_immediately() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["c", "a", "b"]),
        vec![
            cmd("set window-scale 2.0"),
            cmd("set window-scale 1.0"),
            cmd("set window-scale 1.5"),
        ]
    );
}

#[test]
fn simple_sequence() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["d", "e", "f"]),
        vec![Outcome::Ignored, Outcome::Ignored, cmd("set window-scale 1.8")]
    );
    assert!(resolver.history().is_empty());
}

#[test]
fn sequence_after_repeated_prefix_key() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["d", "e", "d", "d", "e"]),
        vec![
            Outcome::Ignored,
            Outcome::Ignored,
            Outcome::Ignored,
            Outcome::Ignored,
            cmd("set window-scale 2.1"),
        ]
    );
}

#[test]
fn shorter_sequence_shadows_longer_one_with_same_suffix() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["d", "d", "d", "e"]),
        vec![
            Outcome::Ignored,
            Outcome::Ignored,
            Outcome::Ignored,
            cmd("set window-scale 2.1"),
        ]
    );
}

#[test]
fn five_key_binding_is_never_matched() {
    let registry = registry();
    let current = registry.current();
    assert!(!current.table().contains_key("d-d-d-d"));
    assert!(
        current
            .user_conf_bindings()
            .iter()
            .any(|binding| binding.mapping().raw_key() == "d-d-d-d-e" && !binding.is_enabled())
    );

    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["d", "d", "d", "d"]),
        vec![Outcome::Ignored; 4]
    );
}

#[test]
fn other_binding_in_the_middle_of_a_sequence() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["g", "h", "j", "i", "g", "h", "i"]),
        vec![
            Outcome::Ignored,
            Outcome::Ignored,
            cmd("seek -5"),
            Outcome::Ignored,
            Outcome::Ignored,
            Outcome::Ignored,
            cmd("set window-scale 1.2"),
        ]
    );
}

#[test]
fn unbound_key_keeps_history() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    assert_eq!(
        press(&mut resolver, &registry, &["g", "z"]),
        vec![Outcome::Ignored, Outcome::Unbound]
    );
    assert_eq!(resolver.history(), vec!["g", "z"]);
}

#[test]
fn windows_keep_separate_histories() {
    let registry = registry();
    let mut first = KeyResolver::new("first");
    let mut second = KeyResolver::new("second");

    press(&mut first, &registry, &["g", "h"]);
    assert_eq!(
        press(&mut second, &registry, &["i"]),
        vec![Outcome::Ignored]
    );
    assert_eq!(
        press(&mut first, &registry, &["i"]),
        vec![cmd("set window-scale 1.2")]
    );
}

#[test]
fn script_section_and_rebuild_take_effect_on_next_key() {
    let registry = registry();
    let mut resolver = KeyResolver::new("main");
    registry.set_active_window("main").expect("activate main");

    registry
        .define_section(
            "main",
            InputSection::from_define_section(
                "console",
                "ESC script-binding console/close\na script-binding console/type-a",
                "force",
            ),
        )
        .expect("define console");
    registry
        .enable_section("main", "console", EnableFlags::parse("exclusive", "console"))
        .expect("enable console");

    assert_eq!(
        press(&mut resolver, &registry, &["a", "c", "ESC"]),
        vec![
            cmd("script-binding console/type-a"),
            Outcome::Unbound,
            cmd("script-binding console/close"),
        ]
    );

    registry.disable_section("main", "console").expect("disable console");
    resolver.reset();
    assert_eq!(
        press(&mut resolver, &registry, &["a"]),
        vec![cmd("set window-scale 1.0")]
    );
}
