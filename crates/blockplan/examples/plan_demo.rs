//! Interpret and plan a command against a small JSON world.
//!
//! Run with `cargo run --example plan_demo`.

use blockplan::{interpret, plan_all, Command, Parse, PlannerConfig, World};

fn main() {
    tracing_subscriber::fmt::init();

    let world: World = serde_json::from_str(
        r#"{
            "objects": {
                "a": { "form": "table", "size": "large", "color": "blue" },
                "b": { "form": "brick", "size": "large", "color": "green" },
                "c": { "form": "box",   "size": "small", "color": "red" },
                "d": { "form": "box",   "size": "large", "color": "yellow" },
                "e": { "form": "ball",  "size": "large", "color": "white" }
            },
            "stacks": [["a"], ["b", "c"], ["d", "e"], []],
            "holding": null,
            "arm": 0
        }"#,
    )
    .expect("world fixture is well-formed");

    let command: Command = serde_json::from_str(
        r#"{
            "verb": "move",
            "entity": { "quantifier": "the", "object": { "form": "ball" } },
            "location": {
                "relation": "ontop",
                "entity": { "quantifier": "the", "object": { "form": "floor" } }
            }
        }"#,
    )
    .expect("command fixture is well-formed");

    let parses = vec![Parse {
        input: "move the ball onto the floor".to_string(),
        command,
    }];

    let interpretations = match interpret(&parses, &world) {
        Ok(interpretations) => interpretations,
        Err(err) => {
            eprintln!("interpretation failed: {}", err);
            return;
        }
    };
    for interpretation in &interpretations {
        println!("goal: {}", interpretation.goal);
    }

    match plan_all(&interpretations, &world, &PlannerConfig::default()) {
        Ok(planned) => {
            for item in &planned {
                for line in &item.plan {
                    println!("{}", line);
                }
            }
        }
        Err(err) => eprintln!("planning failed: {}", err),
    }
}
