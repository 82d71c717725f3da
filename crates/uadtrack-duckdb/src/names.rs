use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "clever", "crimson", "dapper", "eager", "fancy", "gentle", "golden",
    "happy", "hidden", "icy", "jolly", "keen", "lively", "lucky", "mellow", "misty", "nimble",
    "noble", "odd", "patient", "proud", "quiet", "rapid", "rustic", "shy", "silent", "silver",
    "sleepy", "swift", "tidy", "vivid", "wandering", "witty", "young", "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "cedar", "comet", "coyote", "dolphin", "ember", "falcon", "fern", "fox",
    "glacier", "harbor", "heron", "island", "lantern", "lynx", "maple", "meadow", "otter", "owl",
    "panda", "pebble", "pine", "quail", "raven", "river", "sparrow", "spruce", "summit", "tiger",
    "tulip", "valley", "walrus", "willow", "wolf", "yak", "zebra",
];

/// Generate a human-readable device name: `adjective-noun-NNNN`.
///
/// Uniqueness is not guaranteed here; callers check the `devices` table and
/// draw again on collision.
pub fn generate_device_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("otter");
    let suffix: u16 = rng.gen_range(0..10_000);
    format!("{adjective}-{noun}-{suffix:04}")
}
