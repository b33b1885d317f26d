//! Left-to-right placement of the people shown in the reference photos.
//!
//! Reference `i` (1-based) is Subject `i` and is rendered as Figure `i`. The order
//! of the reference list is therefore the spatial order of the portrait.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastMember {
    pub index: usize,
    pub label: &'static str,
}

impl CastMember {
    pub fn directive(&self) -> String {
        format!(
            "- **Figure {index} ({label})**: Must be a forensic match to **[Subject {index}]**.",
            index = self.index,
            label = self.label
        )
    }
}

/// Label for 1-based `index` in a cast of `count` people.
pub fn spatial_label(index: usize, count: usize) -> &'static str {
    match count {
        0 | 1 => "Center",
        2 => {
            if index == 1 {
                "Left"
            } else {
                "Right"
            }
        }
        _ => {
            if index == 1 {
                "Far Left"
            } else if index == count {
                "Far Right"
            } else {
                "Center/Middle"
            }
        }
    }
}

pub fn cast_list(count: usize) -> Vec<CastMember> {
    (1..=count)
        .map(|index| CastMember {
            index,
            label: spatial_label(index, count),
        })
        .collect()
}

/// Number of people the portrait must contain. Any reference photo makes the
/// photo count authoritative over the people-count option.
pub fn effective_people_count(people_count: Option<&str>, reference_count: usize) -> Option<String> {
    if reference_count > 0 {
        Some(reference_count.to_string())
    } else {
        people_count.map(str::to_string)
    }
}
