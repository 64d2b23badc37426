/// Requests from signals or other outside sources. Unlike timer ticks these
/// are never dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Render even if the fingerprint is unchanged.
    Refresh,
    /// Move the picture rotation by this many positions.
    ShiftOffset(i64),
    /// Add this much to the persisted intensity.
    AdjustIntensity(f32),
}
