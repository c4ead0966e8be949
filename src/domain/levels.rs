//! XP and Level system
//!
//! Every `XP_PER_LEVEL` XP raises the level by one, starting at level 1.
//! Titles are cosmetic and assigned by level band.

/// XP needed for each level step
pub const XP_PER_LEVEL: i64 = 100;

/// Title band: levels from `from_level` upward carry `title`
#[derive(Debug, Clone)]
pub struct TitleBand {
    pub from_level: u32,
    pub title: &'static str,
}

/// All title bands (must be sorted by level)
pub static TITLES: &[TitleBand] = &[
    TitleBand {
        from_level: 1,
        title: "Hunt & Peck",
    },
    TitleBand {
        from_level: 3,
        title: "Home Row",
    },
    TitleBand {
        from_level: 6,
        title: "Touch Typist",
    },
    TitleBand {
        from_level: 10,
        title: "Swift Keys",
    },
    TitleBand {
        from_level: 20,
        title: "Keyboard Virtuoso",
    },
    TitleBand {
        from_level: 40,
        title: "Legendary",
    },
];

/// Level reached with `xp` total XP
pub fn level_for_xp(xp: i64) -> u32 {
    let steps = xp.max(0) / XP_PER_LEVEL;
    u32::try_from(steps).unwrap_or(u32::MAX - 1) + 1
}

/// Title for a level
pub fn title_for_level(level: u32) -> &'static str {
    TITLES
        .iter()
        .rev()
        .find(|band| level >= band.from_level)
        .map(|band| band.title)
        .unwrap_or(TITLES[0].title)
}

/// Total XP at which `level` begins
pub fn xp_for_level(level: u32) -> i64 {
    i64::from(level.saturating_sub(1)) * XP_PER_LEVEL
}

/// A level boundary crossed by an XP award
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub new_title: String,
}

/// Compare XP before and after an award
pub fn level_up(xp_before: i64, xp_after: i64) -> Option<LevelUp> {
    let old_level = level_for_xp(xp_before);
    let new_level = level_for_xp(xp_after);
    (new_level > old_level).then(|| LevelUp {
        old_level,
        new_level,
        new_title: title_for_level(new_level).to_string(),
    })
}

/// Progress through the current level (0.0 - 1.0)
pub fn progress_to_next(xp: i64) -> f32 {
    let into_level = xp.max(0) % XP_PER_LEVEL;
    into_level as f32 / XP_PER_LEVEL as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);
        assert_eq!(level_for_xp(-10), 1);
    }

    #[test]
    fn test_titles() {
        assert_eq!(title_for_level(1), "Hunt & Peck");
        assert_eq!(title_for_level(5), "Home Row");
        assert_eq!(title_for_level(25), "Keyboard Virtuoso");
        assert_eq!(title_for_level(400), "Legendary");
    }

    #[test]
    fn test_level_up_detection() {
        assert_eq!(level_up(90, 95), None);
        let up = level_up(90, 210).unwrap();
        assert_eq!(up.old_level, 1);
        assert_eq!(up.new_level, 3);
        assert_eq!(up.new_title, "Home Row");
    }

    #[test]
    fn test_progress() {
        assert!((progress_to_next(175) - 0.75).abs() < 0.001);
        assert_eq!(xp_for_level(3), 200);
    }
}
