// Setup validation: is this bag a legal game for this many players?

use crate::script::{RoleDistribution, Script, SetupModifier, Team};
use crate::session::Player;

/// Outcome of checking a bag against the expected distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub is_complete: bool,
    /// Effective quota, `None` when the script has no quota for this count.
    pub expected: Option<RoleDistribution>,
    pub actual: RoleDistribution,
    pub player_count: u8,
    pub bag_size: usize,
    pub missing_drunk_extra: bool,
}

impl SetupReport {
    /// Human-readable reasons the bag is not complete yet.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.bag_size != self.player_count as usize {
            problems.push(format!(
                "Bag holds {} roles for {} players",
                self.bag_size, self.player_count
            ));
        }

        if let Some(expected) = &self.expected {
            for team in Team::ALL {
                let diff = expected.get(team) as i16 - self.actual.get(team) as i16;
                let plural = |n: i16| {
                    if n != 1 && team != Team::Townsfolk {
                        "s"
                    } else {
                        ""
                    }
                };
                if diff > 0 {
                    problems.push(format!("Missing {} {}{}", diff, team.label(), plural(diff)));
                } else if diff < 0 {
                    problems.push(format!(
                        "{} too many {}{}",
                        -diff,
                        team.label(),
                        plural(-diff)
                    ));
                }
            }
        }

        if self.missing_drunk_extra {
            problems.push("The Drunk needs a Townsfolk to believe they are".to_string());
        }

        problems
    }
}

/// Base quota, effective quota and the modifiers that turned one into the
/// other, alongside what the bag actually holds.
#[derive(Debug, Clone)]
pub struct DistributionAnalysis {
    pub base: Option<RoleDistribution>,
    pub expected: Option<RoleDistribution>,
    pub actual: RoleDistribution,
    pub modifiers: Vec<(String, SetupModifier)>,
}

/// Count bag roles per team. Roles not on the script are not counted.
pub fn count_by_team<S: AsRef<str>>(script: &Script, bag: &[S]) -> RoleDistribution {
    let mut actual = RoleDistribution::default();
    for role in bag {
        if let Some(team) = script.team_of(role.as_ref()) {
            actual.increment(team);
        }
    }
    actual
}

pub fn analyze_distribution<S: AsRef<str>>(
    script: &Script,
    player_count: u8,
    bag: &[S],
) -> DistributionAnalysis {
    let base = script.expected_setup(player_count);
    let actual = count_by_team(script, bag);

    let modifiers: Vec<(String, SetupModifier)> = bag
        .iter()
        .filter_map(|role| {
            script
                .setup_modifier(role.as_ref())
                .map(|modifier| (role.as_ref().to_string(), modifier))
        })
        .collect();

    let expected = base.map(|base| {
        let mut expected = base;
        for (_, modifier) in &modifiers {
            modifier.apply(&mut expected);
        }
        expected
    });

    DistributionAnalysis {
        base,
        expected,
        actual,
        modifiers,
    }
}

/// Quota after applying every setup modifier present in the bag.
pub fn expected_setup<S: AsRef<str>>(
    script: &Script,
    player_count: u8,
    bag: &[S],
) -> Option<RoleDistribution> {
    analyze_distribution(script, player_count, bag).expected
}

/// A bag is complete when it seats everyone, matches the effective quota
/// (if the script has one for this count) and, when the Drunk is in play,
/// the Drunk's pretend Townsfolk has been chosen.
pub fn validate_setup<S: AsRef<str>>(
    script: &Script,
    player_count: u8,
    bag: &[S],
    drunk_extra_role: Option<&str>,
) -> SetupReport {
    let analysis = analyze_distribution(script, player_count, bag);

    let drunk_in_bag = script
        .drunk_role()
        .is_some_and(|drunk| bag.iter().any(|role| role.as_ref() == drunk));
    let missing_drunk_extra = drunk_in_bag && drunk_extra_role.map_or(true, str::is_empty);

    let counts_match = analysis
        .expected
        .map_or(true, |expected| expected == analysis.actual);

    SetupReport {
        is_complete: bag.len() == player_count as usize && counts_match && !missing_drunk_extra,
        expected: analysis.expected,
        actual: analysis.actual,
        player_count,
        bag_size: bag.len(),
        missing_drunk_extra,
    }
}

fn pick_roles<'a>(pool: &'a [String], count: u8, preferred: &[&str]) -> Vec<&'a str> {
    let count = count as usize;
    let mut picked: Vec<&str> = Vec::new();

    for role in pool {
        if picked.len() >= count {
            break;
        }
        if preferred.contains(&role.as_str()) {
            picked.push(role);
        }
    }

    for role in pool {
        if picked.len() >= count {
            break;
        }
        if !picked.contains(&role.as_str()) {
            picked.push(role);
        }
    }

    picked
}

/// Suggest a bag that meets the effective quota, picking roles in catalog
/// order and keeping any setup-modifying role already chosen.
///
/// Without a quota for this count nothing can be recommended and the bag
/// comes back unchanged. The result is a suggestion only; check it with
/// [`validate_setup`].
pub fn recommend_fill<S: AsRef<str>>(script: &Script, player_count: u8, bag: &[S]) -> Vec<String> {
    let Some(expected) = expected_setup(script, player_count, bag) else {
        return bag.iter().map(|role| role.as_ref().to_string()).collect();
    };

    let preferred: Vec<&str> = bag
        .iter()
        .map(AsRef::as_ref)
        .filter(|role| script.setup_modifier(role).is_some())
        .collect();

    let mut recommended: Vec<&str> = Vec::new();
    for team in Team::ALL {
        recommended.extend(pick_roles(script.category(team), expected.get(team), &preferred));
    }

    for role in script.all_roles() {
        if recommended.len() >= player_count as usize {
            break;
        }
        if !recommended.contains(&role) {
            recommended.push(role);
        }
    }

    recommended.truncate(player_count as usize);
    recommended.into_iter().map(str::to_string).collect()
}

/// Roles a seat may be dealt: bag roles nobody else holds, plus whatever the
/// seat already has.
pub fn assignable_roles(bag: &[String], players: &[Player], player_id: u8) -> Vec<String> {
    let current = players
        .iter()
        .find(|player| player.id == player_id)
        .and_then(|player| player.character.as_deref());

    bag.iter()
        .filter(|role| {
            Some(role.as_str()) == current
                || !players
                    .iter()
                    .any(|player| player.id != player_id && player.has_role(role))
        })
        .cloned()
        .collect()
}
