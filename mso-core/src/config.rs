/// Tunables the host sets per engine instance (spec.md §6 "Configuration
/// options").
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Above this vertex count, `power-set` candidate generation fails
    /// with `over-limit` rather than silently running for a long time.
    pub max_power_set_vertices: usize,
    /// Above this many admitted witnesses, collection fails with
    /// `too-large-result`.
    pub max_result_subsets: usize,
    /// If `true` (the default), expression errors coerce to `false`. If
    /// `false`, they propagate as a fatal `expression-error`.
    pub catch_expression_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_power_set_vertices: 20,
            max_result_subsets: 10_000,
            catch_expression_errors: true,
        }
    }
}
