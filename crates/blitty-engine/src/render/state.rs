use bitflags::bitflags;

bitflags! {
    /// Pipeline state bits, using the same values as bgfx's `BGFX_STATE_*`.
    ///
    /// Several fields (depth test, blend, cull, primitive) are multi-bit values
    /// packed into the mask. Use the accessors on this type to decode them rather
    /// than `contains`.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct StateFlags: u64 {
        const WRITE_R = 0x0000_0000_0000_0001;
        const WRITE_G = 0x0000_0000_0000_0002;
        const WRITE_B = 0x0000_0000_0000_0004;
        const WRITE_A = 0x0000_0000_0000_0008;
        const WRITE_Z = 0x0000_0040_0000_0000;
        const WRITE_RGB = Self::WRITE_R.bits() | Self::WRITE_G.bits() | Self::WRITE_B.bits();

        const DEPTH_TEST_LESS = 0x0000_0000_0000_0010;
        const DEPTH_TEST_LEQUAL = 0x0000_0000_0000_0020;
        const DEPTH_TEST_EQUAL = 0x0000_0000_0000_0030;
        const DEPTH_TEST_GEQUAL = 0x0000_0000_0000_0040;
        const DEPTH_TEST_GREATER = 0x0000_0000_0000_0050;
        const DEPTH_TEST_NOTEQUAL = 0x0000_0000_0000_0060;
        const DEPTH_TEST_NEVER = 0x0000_0000_0000_0070;
        const DEPTH_TEST_ALWAYS = 0x0000_0000_0000_0080;

        const CULL_CW = 0x0000_0010_0000_0000;
        const CULL_CCW = 0x0000_0020_0000_0000;

        const BLEND_ALPHA_TO_COVERAGE = 0x0000_0008_0000_0000;

        const PT_TRISTRIP = 0x0001_0000_0000_0000;
        const PT_LINES = 0x0002_0000_0000_0000;
        const PT_LINESTRIP = 0x0003_0000_0000_0000;
        const PT_POINTS = 0x0004_0000_0000_0000;

        const MSAA = 0x0100_0000_0000_0000;
    }
}

impl StateFlags {
    pub const DEPTH_TEST_MASK: u64 = 0x0000_0000_0000_00f0;
    pub const BLEND_MASK: u64 = 0x0000_0000_0fff_f000;
    pub const CULL_MASK: u64 = 0x0000_0030_0000_0000;
    pub const PT_MASK: u64 = 0x0007_0000_0000_0000;

    /// Default write/depth mask every render state starts from.
    pub const BASE: StateFlags = StateFlags::WRITE_RGB
        .union(StateFlags::WRITE_A)
        .union(StateFlags::WRITE_Z)
        .union(StateFlags::DEPTH_TEST_LEQUAL)
        .union(StateFlags::MSAA);

    /// Depth comparison encoded in the mask, `None` when depth testing is off.
    pub fn depth_test(self) -> Option<DepthTest> {
        DepthTest::from_bits(self.bits() & Self::DEPTH_TEST_MASK)
    }

    /// Blend factors encoded in the mask, `None` when blending is off.
    pub fn blend_factors(self) -> Option<BlendFactors> {
        let bits = self.bits() & Self::BLEND_MASK;
        if bits == 0 {
            return None;
        }
        let src_rgb = BlendFactor::from_bits(bits & 0xf000)?;
        let dst_rgb = BlendFactor::from_bits((bits >> 4) & 0xf000)?;
        let src_alpha = BlendFactor::from_bits((bits >> 8) & 0xf000)?;
        let dst_alpha = BlendFactor::from_bits((bits >> 12) & 0xf000)?;
        Some(BlendFactors { src_rgb, dst_rgb, src_alpha, dst_alpha })
    }

    pub fn cull(self) -> Option<CullMode> {
        match self.bits() & Self::CULL_MASK {
            b if b == Self::CULL_CW.bits() => Some(CullMode::Clockwise),
            b if b == Self::CULL_CCW.bits() => Some(CullMode::CounterClockwise),
            _ => None,
        }
    }

    pub fn primitive(self) -> PrimitiveType {
        match self.bits() & Self::PT_MASK {
            b if b == Self::PT_TRISTRIP.bits() => PrimitiveType::TriangleStrip,
            b if b == Self::PT_LINES.bits() => PrimitiveType::Lines,
            b if b == Self::PT_LINESTRIP.bits() => PrimitiveType::LineStrip,
            b if b == Self::PT_POINTS.bits() => PrimitiveType::Points,
            _ => PrimitiveType::Triangles,
        }
    }

    /// Replaces the primitive field.
    pub fn with_primitive(self, primitive: PrimitiveType) -> StateFlags {
        StateFlags::from_bits_retain(self.bits() & !Self::PT_MASK) | primitive.flags()
    }
}

/// Depth comparison function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DepthTest {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
    Never,
    Always,
}

impl DepthTest {
    fn from_bits(bits: u64) -> Option<Self> {
        Some(match bits {
            0x10 => Self::Less,
            0x20 => Self::LessEqual,
            0x30 => Self::Equal,
            0x40 => Self::GreaterEqual,
            0x50 => Self::Greater,
            0x60 => Self::NotEqual,
            0x70 => Self::Never,
            0x80 => Self::Always,
            _ => return None,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CullMode {
    Clockwise,
    CounterClockwise,
}

/// Topology a mesh is submitted with.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

impl PrimitiveType {
    pub const fn flags(self) -> StateFlags {
        match self {
            PrimitiveType::Triangles => StateFlags::empty(),
            PrimitiveType::TriangleStrip => StateFlags::PT_TRISTRIP,
            PrimitiveType::Lines => StateFlags::PT_LINES,
            PrimitiveType::LineStrip => StateFlags::PT_LINESTRIP,
            PrimitiveType::Points => StateFlags::PT_POINTS,
        }
    }
}

/// Blend factor, valued as bgfx's `BGFX_STATE_BLEND_*` nibble in the 0xf000 lane.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum BlendFactor {
    Zero = 0x1000,
    One = 0x2000,
    SrcColor = 0x3000,
    InvSrcColor = 0x4000,
    SrcAlpha = 0x5000,
    InvSrcAlpha = 0x6000,
    DstAlpha = 0x7000,
    InvDstAlpha = 0x8000,
    DstColor = 0x9000,
    InvDstColor = 0xa000,
    SrcAlphaSat = 0xb000,
    Factor = 0xc000,
    InvFactor = 0xd000,
}

impl BlendFactor {
    fn from_bits(bits: u64) -> Option<Self> {
        use BlendFactor::*;
        Some(match bits {
            0x1000 => Zero,
            0x2000 => One,
            0x3000 => SrcColor,
            0x4000 => InvSrcColor,
            0x5000 => SrcAlpha,
            0x6000 => InvSrcAlpha,
            0x7000 => DstAlpha,
            0x8000 => InvDstAlpha,
            0x9000 => DstColor,
            0xa000 => InvDstColor,
            0xb000 => SrcAlphaSat,
            0xc000 => Factor,
            0xd000 => InvFactor,
            _ => return None,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlendFactors {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

/// Packs separate color/alpha blend factors into state bits.
pub const fn blend_func_separate(
    src_rgb: BlendFactor,
    dst_rgb: BlendFactor,
    src_alpha: BlendFactor,
    dst_alpha: BlendFactor,
) -> u64 {
    (src_rgb as u64 | (dst_rgb as u64) << 4) | ((src_alpha as u64 | (dst_alpha as u64) << 4) << 8)
}

/// Packs the same factors for color and alpha.
pub const fn blend_func(src: BlendFactor, dst: BlendFactor) -> u64 {
    blend_func_separate(src, dst, src, dst)
}

/// Closed set of blend presets.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Solid,
    Mask,
    Add,
    #[default]
    Alpha,
    AlphaPre,
    Multiply,
    Light,
    Invert,
}

impl BlendMode {
    pub const ALL: [BlendMode; 8] = [
        BlendMode::Solid,
        BlendMode::Mask,
        BlendMode::Add,
        BlendMode::Alpha,
        BlendMode::AlphaPre,
        BlendMode::Multiply,
        BlendMode::Light,
        BlendMode::Invert,
    ];

    pub const fn flags(self) -> StateFlags {
        use BlendFactor::*;
        let bits = match self {
            BlendMode::Solid => 0,
            BlendMode::Mask => StateFlags::BLEND_ALPHA_TO_COVERAGE.bits(),
            BlendMode::Add => blend_func_separate(SrcAlpha, One, One, One),
            BlendMode::Alpha => blend_func_separate(SrcAlpha, InvSrcAlpha, One, InvSrcAlpha),
            BlendMode::AlphaPre => blend_func(One, InvSrcAlpha),
            BlendMode::Multiply => blend_func(DstColor, Zero),
            BlendMode::Light => blend_func_separate(DstColor, One, Zero, One),
            BlendMode::Invert => blend_func(InvDstColor, InvSrcColor),
        };
        StateFlags::from_bits_retain(bits)
    }
}

/// Immutable render state: base write/depth mask plus a blend preset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderState {
    blend: BlendMode,
    flags: StateFlags,
}

impl RenderState {
    pub const fn new(blend: BlendMode) -> Self {
        Self {
            blend,
            flags: StateFlags::BASE.union(blend.flags()),
        }
    }

    pub const fn blend(self) -> BlendMode {
        self.blend
    }

    pub const fn flags(self) -> StateFlags {
        self.flags
    }

    pub const fn with_cull(self, cull: Option<CullMode>) -> Self {
        let bits = self.flags.bits() & !StateFlags::CULL_MASK;
        let cull_bits = match cull {
            Some(CullMode::Clockwise) => StateFlags::CULL_CW.bits(),
            Some(CullMode::CounterClockwise) => StateFlags::CULL_CCW.bits(),
            None => 0,
        };
        Self {
            blend: self.blend,
            flags: StateFlags::from_bits_retain(bits | cull_bits),
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(BlendMode::Alpha)
    }
}

impl From<BlendMode> for RenderState {
    fn from(blend: BlendMode) -> Self {
        Self::new(blend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── blend table ───────────────────────────────────────────────────────

    #[test]
    fn base_mask_matches_bgfx_values() {
        assert_eq!(StateFlags::BASE.bits(), 0x0100_0040_0000_002f);
    }

    #[test]
    fn blend_table_bits() {
        let expected: [(BlendMode, u64); 8] = [
            (BlendMode::Solid, 0),
            (BlendMode::Mask, 0x0000_0008_0000_0000),
            (BlendMode::Add, 0x0222_5000),
            (BlendMode::Alpha, 0x0626_5000),
            (BlendMode::AlphaPre, 0x0626_2000),
            (BlendMode::Multiply, 0x0191_9000),
            (BlendMode::Light, 0x0212_9000),
            (BlendMode::Invert, 0x04a4_a000),
        ];
        for (mode, bits) in expected {
            assert_eq!(mode.flags().bits(), bits, "{mode:?}");
            assert_eq!(RenderState::new(mode).flags().bits(), StateFlags::BASE.bits() | bits);
        }
    }

    #[test]
    fn default_state_is_alpha() {
        let s = RenderState::default();
        assert_eq!(s.blend(), BlendMode::Alpha);
        assert_eq!(s.flags().bits(), 0x0100_0040_0626_502f);
    }

    // ── decoding ──────────────────────────────────────────────────────────

    #[test]
    fn blend_factors_decode_roundtrip() {
        let f = BlendMode::Light.flags().blend_factors().unwrap();
        assert_eq!(f.src_rgb, BlendFactor::DstColor);
        assert_eq!(f.dst_rgb, BlendFactor::One);
        assert_eq!(f.src_alpha, BlendFactor::Zero);
        assert_eq!(f.dst_alpha, BlendFactor::One);
        assert!(BlendMode::Solid.flags().blend_factors().is_none());
        assert!(BlendMode::Mask.flags().blend_factors().is_none());
    }

    #[test]
    fn depth_and_primitive_decode() {
        let s = RenderState::default().flags();
        assert_eq!(s.depth_test(), Some(DepthTest::LessEqual));
        assert_eq!(s.primitive(), PrimitiveType::Triangles);

        let lines = s.with_primitive(PrimitiveType::LineStrip);
        assert_eq!(lines.primitive(), PrimitiveType::LineStrip);
        assert_eq!(lines.with_primitive(PrimitiveType::Points).primitive(), PrimitiveType::Points);
        assert_eq!(lines.blend_factors(), s.blend_factors());
    }

    #[test]
    fn cull_replaces_previous_value() {
        let s = RenderState::default().with_cull(Some(CullMode::Clockwise));
        assert_eq!(s.flags().cull(), Some(CullMode::Clockwise));
        let s = s.with_cull(Some(CullMode::CounterClockwise));
        assert_eq!(s.flags().cull(), Some(CullMode::CounterClockwise));
        assert_eq!(s.with_cull(None).flags(), RenderState::default().flags());
    }
}
