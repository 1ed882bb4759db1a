mod common;

use arkavo_mobile::{
    GestureOptions, MobileEngine, PinchDirection, Point, ScrollDirection, SwipeDirection,
    TargetDescriptor,
};
use common::{MockChannel, app_screen, list_with_rows, test_config};
use serde_json::json;
use std::sync::Arc;

fn engine(channel: &Arc<MockChannel>) -> MobileEngine {
    MobileEngine::new(test_config(), channel.clone())
}

#[tokio::test(start_paused = true)]
async fn test_pinch_out_is_one_compound_gesture() {
    let channel = Arc::new(MockChannel::new("emulator-5554"));
    let result = engine(&channel)
        .pinch_on(None, PinchDirection::Out, 400.0, Some(500))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.detail("fingers"), Some(&json!(2)));
    assert_eq!(
        channel.swipes(),
        vec!["input swipe 540 1140 540 1000 500 & input swipe 540 1260 540 1400 500 & wait".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_multi_touch_channel_gets_one_pointer_stream() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_multi_touch());
    let result = engine(&channel)
        .pinch_on(None, PinchDirection::Out, 400.0, Some(500))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(
        channel.commands_starting_with("input motionevent"),
        vec![
            "input motionevent DOWN 0 540 1140; input motionevent POINTER_DOWN 1 540 1260; \
             sleep 0.500; input motionevent MOVE 0 540 1000; input motionevent MOVE 1 540 1400; \
             input motionevent POINTER_UP 0 540 1000; input motionevent UP 1 540 1400"
                .to_string()
        ]
    );
    assert!(channel.swipes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_small_pinch_in_uses_floor() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[
        r#"<node text="" resource-id="com.example:id/map" class="android.view.View" bounds="[0,0][1000,1000]" />"#,
    ])));
    engine(&channel)
        .pinch_on(
            Some(&TargetDescriptor::resource_id("map")),
            PinchDirection::In,
            100.0,
            None,
        )
        .await
        .unwrap();

    // starting = 100, ending = max(50, 30) = 50
    assert_eq!(
        channel.swipes(),
        vec!["input swipe 500 450 500 475 500 & input swipe 500 550 500 525 500 & wait".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scroll_down_swipes_content_up() {
    let channel = Arc::new(
        MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[&list_with_rows(&["A", "B"])])),
    );
    let result = engine(&channel)
        .scroll(Some("list"), ScrollDirection::Down, GestureOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(channel.swipes(), vec!["input swipe 540 1640 540 560 300".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_up_swipes_content_down() {
    let channel = Arc::new(
        MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[&list_with_rows(&["A"])])),
    );
    engine(&channel)
        .scroll(None, ScrollDirection::Up, GestureOptions::default())
        .await
        .unwrap();

    assert_eq!(channel.swipes(), vec!["input swipe 540 560 540 1640 300".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_without_container_reports_not_found() {
    let channel = Arc::new(MockChannel::new("emulator-5554"));
    let result = engine(&channel)
        .scroll(None, ScrollDirection::Down, GestureOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "ELEMENT_NOT_FOUND");
    assert!(channel.swipes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scroll_until_visible_reports_attempts() {
    let before = app_screen(&[&list_with_rows(&["Alpha", "Beta"])]);
    let after = app_screen(&[&list_with_rows(&["Gamma", "Target row"])]);
    let channel = Arc::new(
        MockChannel::new("emulator-5554").with_hierarchies(vec![before.clone(), before, after]),
    );

    let result = engine(&channel)
        .scroll_until_visible("target", Some("list"), ScrollDirection::Down, Some(3))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.detail("attempts"), Some(&json!(2)));
    assert_eq!(result.detail("x"), Some(&json!(540)));
    assert_eq!(result.detail("y"), Some(&json!(500)));
    assert_eq!(channel.swipes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_until_visible_ignores_matches_outside_container() {
    const BANNER: &str = r#"<node text="Target banner" resource-id="com.example:id/banner" class="android.widget.TextView" bounds="[0,2000][1080,2200]" />"#;
    let before = app_screen(&[&list_with_rows(&["Alpha", "Beta"]), BANNER]);
    let after = app_screen(&[&list_with_rows(&["Gamma", "Target row"]), BANNER]);
    let channel = Arc::new(
        MockChannel::new("emulator-5554").with_hierarchies(vec![before.clone(), before, after]),
    );

    let result = engine(&channel)
        .scroll_until_visible("target", Some("list"), ScrollDirection::Down, Some(3))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.detail("attempts"), Some(&json!(2)));
    assert_eq!(result.detail("y"), Some(&json!(500)));
    assert_eq!(channel.swipes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_in_malformed_container_says_why() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[
        r#"<node text="" resource-id="com.example:id/feed" class="android.widget.ScrollView" scrollable="true" bounds="[0,200][1080" />"#,
    ])));

    let result = engine(&channel)
        .scroll(Some("feed"), ScrollDirection::Down, GestureOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.code, "ELEMENT_NOT_FOUND");
    assert!(error.message.contains("container 'feed' has unparseable bounds"));
    assert!(channel.swipes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scroll_until_visible_gives_up() {
    let channel = Arc::new(
        MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[&list_with_rows(&["Alpha"])])),
    );

    let result = engine(&channel)
        .scroll_until_visible("Omega", None, ScrollDirection::Down, Some(2))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.detail("attempts"), Some(&json!(3)));
    assert_eq!(result.error.as_ref().unwrap().code, "TEXT_NOT_VISIBLE");
    assert_eq!(channel.swipes().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_drag_and_drop_between_element_centers() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[
        r#"<node text="Card" resource-id="com.example:id/card" class="android.view.View" bounds="[0,0][200,200]" />"#,
        r#"<node text="Done" resource-id="com.example:id/done_column" class="android.view.View" bounds="[800,0][1000,1001]" />"#,
    ])));

    engine(&channel)
        .drag_and_drop(
            &TargetDescriptor::resource_id("card"),
            &TargetDescriptor::text("Done"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(channel.swipes(), vec!["input swipe 100 100 900 500 1000".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_fling_stays_inside_content_area() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_hierarchy(app_screen(&[
        r#"<node text="" resource-id="android:id/statusBarBackground" class="android.view.View" bounds="[0,0][1080,100]" />"#,
        r#"<node text="" resource-id="android:id/navigationBarBackground" class="android.view.View" bounds="[0,2300][1080,2400]" />"#,
    ])));

    engine(&channel).fling(SwipeDirection::Up).await.unwrap();

    // Content area [0,100][1080,2300]: 20% of 2200 kept clear at each end.
    assert_eq!(channel.swipes(), vec!["input swipe 540 1860 540 540 100".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_eased_swipe_degrades_to_two_points() {
    let channel = Arc::new(MockChannel::new("emulator-5554"));
    let options = GestureOptions {
        steps: 8,
        easing: arkavo_mobile::gesture::Easing::AccelerateDecelerate,
        ..GestureOptions::default()
    };

    engine(&channel)
        .swipe(Point { x: 100, y: 2000 }, Point { x: 100, y: 500 }, options)
        .await
        .unwrap();

    assert_eq!(channel.swipes(), vec!["input swipe 100 2000 100 500 300".to_string()]);
    assert!(channel.commands_starting_with("input motionevent").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_path_channel_gets_motion_events() {
    let channel = Arc::new(MockChannel::new("emulator-5554").with_path_gestures());
    let options = GestureOptions {
        steps: 3,
        lift: false,
        ..GestureOptions::default()
    };

    engine(&channel)
        .swipe(Point { x: 0, y: 0 }, Point { x: 0, y: 100 }, options)
        .await
        .unwrap();

    let motion = channel.commands_starting_with("input motionevent");
    assert_eq!(
        motion,
        vec!["input motionevent DOWN 0 0; sleep 0.150; input motionevent MOVE 0 50; sleep 0.150; input motionevent MOVE 0 100".to_string()]
    );
    assert!(channel.swipes().is_empty());
}
