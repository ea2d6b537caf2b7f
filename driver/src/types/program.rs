//! Program (shader pair) descriptors.

use crate::sampler_buffer::SamplerInterfaceBlock;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Number of stages.
    pub const COUNT: usize = 2;

    const fn index(self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::Fragment => 1,
        }
    }
}

/// Maximum number of sampler groups a program can bind.
pub const MAX_SAMPLER_GROUP_BINDINGS: usize = 8;

/// Everything a backend needs to build a program.
///
/// Shader sources are opaque byte blobs; compiling them is the backend's
/// business.
#[derive(Debug, Clone, Default)]
pub struct Program {
    name: String,
    shaders: [Vec<u8>; ShaderStage::COUNT],
    sampler_groups: Vec<(u8, SamplerInterfaceBlock)>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the source of one stage.
    pub fn with_shader(mut self, stage: ShaderStage, source: impl Into<Vec<u8>>) -> Self {
        self.shaders[stage.index()] = source.into();
        self
    }

    /// Declare the sampler group bound at `binding`.
    ///
    /// Bindings at or above [`MAX_SAMPLER_GROUP_BINDINGS`] are dropped with a
    /// warning. Redeclaring a binding replaces the previous block.
    pub fn with_sampler_group(mut self, binding: u8, block: SamplerInterfaceBlock) -> Self {
        if usize::from(binding) >= MAX_SAMPLER_GROUP_BINDINGS {
            log::warn!(
                "Program '{}': sampler group binding {} out of range",
                self.name,
                binding
            );
            return self;
        }
        self.sampler_groups.retain(|(b, _)| *b != binding);
        self.sampler_groups.push((binding, block));
        self.sampler_groups.sort_by_key(|(b, _)| *b);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source of `stage`, empty if unset.
    pub fn shader(&self, stage: ShaderStage) -> &[u8] {
        &self.shaders[stage.index()]
    }

    /// Sampler groups sorted by binding.
    pub fn sampler_groups(&self) -> &[(u8, SamplerInterfaceBlock)] {
        &self.sampler_groups
    }

    /// Sampler interface block declared at `binding`.
    pub fn sampler_group(&self, binding: u8) -> Option<&SamplerInterfaceBlock> {
        self.sampler_groups
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, block)| block)
    }

    /// Total number of samplers across all groups.
    pub fn sampler_count(&self) -> usize {
        self.sampler_groups.iter().map(|(_, block)| block.len()).sum()
    }
}
