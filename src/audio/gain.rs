/// Map a volume level in `[0.0, 1.0]` to an amplitude multiplier.
///
/// The curve is exponential so equal volume steps sound like equal loudness
/// steps: full volume is unity gain and every `0.2` below it halves the
/// amplitude. Level `0.0` is silence.
pub fn volume_to_gain(level: f64) -> f32 {
    let level = level.clamp(0.0, 1.0);
    if level <= 0.0 {
        return 0.0;
    }
    2f64.powf((level - 1.0) * 5.0) as f32
}
