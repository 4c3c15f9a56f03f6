use serde::{Deserialize, Serialize};

/// Sentinel `max_occurs` for `maxOccurs="unbounded"`.
pub const UNBOUNDED: usize = usize::MAX;

/// Opaque compositor / choice group identifier.
///
/// Parser assigned ids are positive, synthetic effective-choice ids are negative.
pub type GroupId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositorKind {
    Sequence,
    Choice,
    Group,
    All,
}

/// One compositor an attr descended through, with that compositor's own occurrence bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEntry {
    pub kind: CompositorKind,
    pub id: GroupId,
    pub min_occurs: usize,
    pub max_occurs: usize,
}

impl PathEntry {
    pub fn new(kind: CompositorKind, id: GroupId, min_occurs: usize, max_occurs: usize) -> Self {
        Self {
            kind,
            id,
            min_occurs,
            max_occurs,
        }
    }

    pub fn sequence(id: GroupId, min_occurs: usize, max_occurs: usize) -> Self {
        Self::new(CompositorKind::Sequence, id, min_occurs, max_occurs)
    }

    pub fn choice(id: GroupId, min_occurs: usize, max_occurs: usize) -> Self {
        Self::new(CompositorKind::Choice, id, min_occurs, max_occurs)
    }

    pub fn group(id: GroupId, min_occurs: usize, max_occurs: usize) -> Self {
        Self::new(CompositorKind::Group, id, min_occurs, max_occurs)
    }
}

/// Cardinality, facets and compositor bookkeeping of an attr.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restrictions {
    pub min_occurs: Option<usize>,
    pub max_occurs: Option<usize>,
    pub required: Option<bool>,
    pub prohibited: Option<bool>,
    pub nillable: Option<bool>,
    pub min_exclusive: Option<String>,
    pub min_inclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub total_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub white_space: Option<String>,
    pub pattern: Option<String>,
    pub explicit_timezone: Option<String>,
    pub tokens: Option<bool>,
    pub format: Option<String>,
    pub choice: Option<GroupId>,
    pub sequence: Option<GroupId>,
    pub sequential: Option<bool>,
    pub group: Option<GroupId>,
    /// Enclosing compositors, innermost first.
    pub path: Vec<PathEntry>,
}

impl Restrictions {
    pub fn occurs(min_occurs: usize, max_occurs: usize) -> Self {
        Self {
            min_occurs: Some(min_occurs),
            max_occurs: Some(max_occurs),
            ..Self::default()
        }
    }

    pub fn is_optional(&self) -> bool {
        self.min_occurs == Some(0)
    }

    pub fn is_prohibited(&self) -> bool {
        self.prohibited == Some(true) || self.max_occurs == Some(0)
    }

    pub fn is_list(&self) -> bool {
        self.max_occurs.unwrap_or(1) > 1
    }

    pub fn is_tokens(&self) -> bool {
        self.tokens == Some(true)
    }

    /// Override every facet `source` sets and adopt its enclosing compositors.
    ///
    /// Compositor markers, `tokens` and `format` keep their current value when present;
    /// occurrence bounds are only filled in when missing.
    pub fn merge(&mut self, source: &Restrictions) {
        self.update(source);

        self.path.extend(source.path.iter().copied());
        self.sequence = self.sequence.or(source.sequence);
        self.choice = self.choice.or(source.choice);
        self.group = self.group.or(source.group);
        self.tokens = self.tokens.or(source.tokens);
        self.format = self.format.take().or_else(|| source.format.clone());

        if self.min_occurs.is_none() {
            self.min_occurs = source.min_occurs;
        }
        if self.max_occurs.is_none() {
            self.max_occurs = source.max_occurs;
        }
    }

    fn update(&mut self, source: &Restrictions) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        set(&mut self.min_exclusive, &source.min_exclusive);
        set(&mut self.min_inclusive, &source.min_inclusive);
        set(&mut self.min_length, &source.min_length);
        set(&mut self.max_exclusive, &source.max_exclusive);
        set(&mut self.max_inclusive, &source.max_inclusive);
        set(&mut self.max_length, &source.max_length);
        set(&mut self.total_digits, &source.total_digits);
        set(&mut self.fraction_digits, &source.fraction_digits);
        set(&mut self.length, &source.length);
        set(&mut self.white_space, &source.white_space);
        set(&mut self.pattern, &source.pattern);
        set(&mut self.explicit_timezone, &source.explicit_timezone);
        set(&mut self.nillable, &source.nillable);
    }

    /// Drop occurrence bounds that carry no information.
    ///
    /// Exactly-one is the implicit default, and a list of tokens is rendered as a sequence
    /// which is never marked required.
    pub fn reset_occurrences(&mut self) {
        if self.min_occurs == Some(1) && self.max_occurs == Some(1) {
            self.min_occurs = None;
            self.max_occurs = None;
        }
        if self.is_tokens() && self.required.is_some() {
            self.required = Some(false);
        }
    }
}

/// Product of two occurrence bounds, saturating at [`UNBOUNDED`].
pub fn mul_occurs(a: usize, b: usize) -> usize {
    if a == 0 || b == 0 {
        0
    } else if a == UNBOUNDED || b == UNBOUNDED {
        UNBOUNDED
    } else {
        a.saturating_mul(b)
    }
}

/// Sum of two occurrence bounds, saturating at [`UNBOUNDED`].
pub fn add_occurs(a: usize, b: usize) -> usize {
    if a == UNBOUNDED || b == UNBOUNDED {
        UNBOUNDED
    } else {
        a.saturating_add(b)
    }
}
