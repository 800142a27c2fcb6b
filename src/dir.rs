use strum::VariantArray;

/// The direction of a [`Side`](crate::side::Side) relative to the cell that owns it.
///
/// The hexagons are pointy-topped, so the six sides sit at the upper-left,
/// upper-right, right, lower-right, lower-left, and left of the cell.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum SideDir {
    /// Upper-left side.
    UpLeft,
    /// Upper-right side.
    UpRight,
    /// Right side.
    Right,
    /// Lower-right side.
    DownRight,
    /// Lower-left side.
    DownLeft,
    /// Left side.
    Left,
}

impl SideDir {
    /// Invert the direction specified by `self`.
    pub fn opposite(&self) -> Self {
        match self {
            Self::UpLeft => Self::DownRight,
            Self::UpRight => Self::DownLeft,
            Self::Right => Self::Left,
            Self::DownRight => Self::UpLeft,
            Self::DownLeft => Self::UpRight,
            Self::Left => Self::Right,
        }
    }

    /// The two side directions sharing a vertex with this one.
    pub fn adjacents(&self) -> (Self, Self) {
        match self {
            Self::UpLeft => (Self::Left, Self::UpRight),
            Self::UpRight => (Self::UpLeft, Self::Right),
            Self::Right => (Self::UpRight, Self::DownRight),
            Self::DownRight => (Self::Right, Self::DownLeft),
            Self::DownLeft => (Self::DownRight, Self::Left),
            Self::Left => (Self::DownLeft, Self::UpLeft),
        }
    }

    /// Whether `other` shares a vertex with this direction.
    pub fn is_adjacent(&self, other: Self) -> bool {
        let (a, b) = self.adjacents();
        other == a || other == b
    }

    /// The two vertex directions bounding a side in this direction.
    pub fn connected_vertex_dirs(&self) -> (VertexDir, VertexDir) {
        match self {
            Self::UpLeft => (VertexDir::Top, VertexDir::UpLeft),
            Self::UpRight => (VertexDir::Top, VertexDir::UpRight),
            Self::Right => (VertexDir::UpRight, VertexDir::DownRight),
            Self::DownRight => (VertexDir::DownRight, VertexDir::Bottom),
            Self::DownLeft => (VertexDir::DownLeft, VertexDir::Bottom),
            Self::Left => (VertexDir::UpLeft, VertexDir::DownLeft),
        }
    }

    #[inline]
    pub(crate) fn ix(self) -> usize {
        self as usize
    }
}

/// The direction of a [`Vertex`](crate::vertex::Vertex) relative to a cell's center.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum VertexDir {
    /// Topmost vertex.
    Top,
    /// Upper-right vertex.
    UpRight,
    /// Lower-right vertex.
    DownRight,
    /// Bottommost vertex.
    Bottom,
    /// Lower-left vertex.
    DownLeft,
    /// Upper-left vertex.
    UpLeft,
}

impl VertexDir {
    /// Invert the direction specified by `self`.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::UpRight => Self::DownLeft,
            Self::DownRight => Self::UpLeft,
            Self::Bottom => Self::Top,
            Self::DownLeft => Self::UpRight,
            Self::UpLeft => Self::DownRight,
        }
    }

    /// The two vertex directions 120 degrees away from this one.
    ///
    /// Together with `self` they form one of the two alternating triples of
    /// the hexagon; anti-pairs at such a triple never share a side.
    pub fn deg120(&self) -> (Self, Self) {
        match self {
            Self::Top => (Self::DownLeft, Self::DownRight),
            Self::UpRight => (Self::UpLeft, Self::Bottom),
            Self::DownRight => (Self::Top, Self::DownLeft),
            Self::Bottom => (Self::UpRight, Self::UpLeft),
            Self::DownLeft => (Self::DownRight, Self::Top),
            Self::UpLeft => (Self::Bottom, Self::UpRight),
        }
    }

    /// The two side directions meeting at a vertex in this direction.
    pub fn connected_side_dirs(&self) -> (SideDir, SideDir) {
        match self {
            Self::Top => (SideDir::UpLeft, SideDir::UpRight),
            Self::UpRight => (SideDir::UpRight, SideDir::Right),
            Self::DownRight => (SideDir::Right, SideDir::DownRight),
            Self::Bottom => (SideDir::DownRight, SideDir::DownLeft),
            Self::DownLeft => (SideDir::DownLeft, SideDir::Left),
            Self::UpLeft => (SideDir::Left, SideDir::UpLeft),
        }
    }

    #[inline]
    pub(crate) fn ix(self) -> usize {
        self as usize
    }
}
