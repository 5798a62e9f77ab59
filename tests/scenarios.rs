//! End-to-end runs of the engine through its public entry points, with the
//! recording collaborators standing in for the terminal.

use adventure_sim::config::EngineConfig;
use adventure_sim::domain::object::WalkDir;
use adventure_sim::domain::route::Point;
use adventure_sim::sim::data::GameData;
use adventure_sim::sim::navigation::{self, WalkTarget};
use adventure_sim::sim::save;
use adventure_sim::sim::services::Headless;
use adventure_sim::sim::step;
use adventure_sim::sim::world::WorldState;

fn world(text: &str) -> WorldState {
    WorldState::new(GameData::from_toml_str(text).unwrap(), EngineConfig::default())
}

fn run(w: &mut WorldState, h: &mut Headless, ticks: u32) {
    for _ in 0..ticks {
        step::step(w, &mut h.services()).unwrap();
    }
}

const STORY: &str = r#"
    texts = ["welcome", "hall reached"]
    bonuses = [10]

    [[screens]]
    name = "porch"
    entry_lists = [0]
    [[screens]]
    name = "hall"
    entry_lists = [1]

    [[objects]]
    name = "hero"
    x = 50
    y = 60
    [[objects]]
    name = "lamp"
    carried = true
    [[objects]]
    name = "key"

    [[lists]]
    actions = [
      { op = "text", text = 0 },
      { op = "new_screen", screen = 1, timer = 3 },
    ]
    [[lists]]
    actions = [
      { op = "text", text = 1 },
      { op = "bonus", index = 0 },
      { op = "bonus", index = 0 },
    ]
"#;

#[test]
fn entry_lists_chain_across_screens() {
    let mut w = world(STORY);
    let mut h = Headless::default();
    w.start(&mut h.services()).unwrap();
    run(&mut w, &mut h, 3);
    assert_eq!(h.text.said, vec!["welcome"]);
    assert_eq!(w.screen, 0);

    run(&mut w, &mut h, 1);
    assert_eq!(h.text.said, vec!["welcome", "hall reached"]);
    assert_eq!(w.screen, 1);
    assert_eq!(h.renderer.screens, vec![0, 1]);
    assert_eq!(w.score, 10);
    assert_eq!(w.objects[0].screen, 1);
    assert_eq!(w.objects[1].screen, 1);
    assert_eq!(w.objects[2].screen, 0);
    assert!(w.queue.is_empty());
}

const CHASE: &str = r#"
    texts = ["caught"]

    [[screens]]
    name = "field"

    [[objects]]
    name = "hero"
    x = 40
    y = 40
    [[objects]]
    name = "dog"
    x = 100
    y = 39
    path_type = "chase"
    vx_path = 5
    action_list = 0

    [[lists]]
    actions = [{ op = "text", text = 0 }, { op = "game_over" }]
"#;

#[test]
fn chaser_runs_down_the_hero() {
    let mut w = world(CHASE);
    let mut h = Headless::default();
    w.start(&mut h.services()).unwrap();
    let mut ticks = 0;
    while !w.flags.game_over {
        assert!(ticks < 30, "dog never caught up");
        step::step(&mut w, &mut h.services()).unwrap();
        ticks += 1;
    }
    assert_eq!(ticks, 12);
    assert_eq!(w.objects[1].x, 45);
    assert_eq!(h.text.said, vec!["caught"]);
    assert!(!w.accepts_commands());
}

const WALK: &str = r#"
    texts = ["first", "second"]

    [[screens]]
    name = "road"
    entry_lists = [0]

    [[objects]]
    name = "hero"
    x = 50
    y = 60

    [[lists]]
    actions = [
      { op = "text", text = 0, timer = 5 },
      { op = "text", text = 1, timer = 8 },
    ]
"#;

#[test]
fn restored_game_continues_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("road.sav");

    let mut original = world(WALK);
    let mut h1 = Headless::default();
    original.start(&mut h1.services()).unwrap();
    assert!(navigation::set_walk(&mut original, WalkDir::Right));
    run(&mut original, &mut h1, 3);
    save::save_to_file(&original, &path).unwrap();

    let mut restored = world(WALK);
    let mut h2 = Headless::default();
    save::load_from_file(&mut restored, &mut h2.services(), &path).unwrap();
    assert_eq!(restored.hero().x, 65);

    run(&mut original, &mut h1, 10);
    run(&mut restored, &mut h2, 10);

    assert_eq!(h1.text.said, vec!["first", "second"]);
    assert_eq!(h2.text.said, h1.text.said);
    assert_eq!(original.hero().x, 115);
    assert_eq!(restored.hero().x, original.hero().x);
    assert_eq!(restored.last_walk, Some(WalkDir::Right));
}

#[test]
fn unreachable_click_leaves_hero_standing() {
    let mut w = world(WALK);
    let mut h = Headless::default();
    w.start(&mut h.services()).unwrap();
    for y in 0..200 {
        w.boundary.set_wall(150, y, true);
    }
    let went =
        navigation::walk_to(&mut w, &mut h.services(), WalkTarget::Point(Point::new(250, 70)))
            .unwrap();
    assert!(!went);
    run(&mut w, &mut h, 5);
    assert_eq!((w.hero().x, w.hero().y), (50, 60));
    assert!(!w.route.is_active());
}

#[test]
fn open_field_click_walks_straight_there() {
    let mut w = world(WALK);
    let mut h = Headless::default();
    w.start(&mut h.services()).unwrap();
    let went =
        navigation::walk_to(&mut w, &mut h.services(), WalkTarget::Point(Point::new(108, 90)))
            .unwrap();
    assert!(went);
    assert_eq!(
        w.route.nodes,
        vec![Point::new(50, 60), Point::new(100, 60), Point::new(100, 90)]
    );
    let mut ticks = 0;
    while w.route.is_active() {
        assert!(ticks < 100, "route never finished");
        step::step(&mut w, &mut h.services()).unwrap();
        ticks += 1;
    }
    assert_eq!(w.hero().feet(), (100, 90));
}

#[test]
fn bundled_demo_story_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("game.toml");
    let data = GameData::load(&path).unwrap();
    assert_eq!(data.screens.len(), 2);
    let mut w = WorldState::new(data, EngineConfig::default());
    let mut h = Headless::default();
    w.start(&mut h.services()).unwrap();
    run(&mut w, &mut h, 1);
    assert_eq!(h.text.said.len(), 1);
    assert_eq!(h.renderer.backgrounds, vec![1]);
    assert!(w.boundary.is_wall(160, 121));
}
