/*
Boundary to the effect compiler and renderer.  The runtime only decides when to compile, which
techniques to run each frame, and when to resize or tear down; everything else happens behind
`EffectSubsystem`.
 */
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technique {
    pub name: String,
    pub enabled: bool,
    /// Reads the scene depth buffer, so it can't run in a frame without a depth selection.
    pub uses_depth: bool,
}

impl Technique {
    pub fn new(name: &str, enabled: bool, uses_depth: bool) -> Self {
        Technique {
            name: name.to_owned(),
            enabled,
            uses_depth,
        }
    }
}

pub type TechniqueSet = Vec<Technique>;

/// Compiler output for a failed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for e in self.errors.iter() {
            writeln!(f, "error: {}", e)?;
        }
        for w in self.warnings.iter() {
            writeln!(f, "warning: {}", w)?;
        }
        Ok(())
    }
}

pub trait EffectSubsystem: Send {
    fn compile(&mut self, source: &str, pragmas: &[String]) -> Result<TechniqueSet, Diagnostics>;
    fn apply(&mut self, technique: &Technique);
    fn on_resize(&mut self, width: u32, height: u32);
    fn on_teardown(&mut self);
}

/// Used when no effect compiler is available: compiles everything to an empty set.
pub struct NoEffects;

impl EffectSubsystem for NoEffects {
    fn compile(&mut self, _source: &str, _pragmas: &[String]) -> Result<TechniqueSet, Diagnostics> {
        Ok(vec![])
    }
    fn apply(&mut self, _technique: &Technique) {}
    fn on_resize(&mut self, _width: u32, _height: u32) {}
    fn on_teardown(&mut self) {}
}
