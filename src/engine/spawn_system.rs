use super::utils::random_direction;
use crate::actors::{Chest, Hostile, Portal};
use crate::arena::Arena;
use crate::collaborators::QuestionBank;
use crate::config::SessionConfig;
use crate::placement::{place_many, place_point};
use crate::rng::RandomSource;
use crate::types::Vec2;

/// Initial positions and contents of every actor.
#[derive(Clone, Debug)]
pub struct Layout {
    pub player_spawn: Vec2,
    pub chests: Vec<Chest>,
    pub portal: Portal,
    pub hostiles: Vec<Hostile>,
}

/// Chests first, anchored on the player spawn; then the portal, clear of the
/// spawn and every chest; then hostiles, kept a wider clearance from the spawn.
pub fn generate_layout(
    config: &SessionConfig,
    arena: &Arena,
    questions: &mut dyn QuestionBank,
    rng: &mut dyn RandomSource,
) -> Layout {
    let player_spawn = arena.player_spawn;
    let placement = config.placement();

    let chest_points = place_many(arena, config.chest_count, &[player_spawn], placement, rng);
    let mut drawn = questions
        .draw(arena.theme.zone(), config.chest_count)
        .into_iter()
        .filter(|question| question.is_well_formed());
    let categories = arena.theme.categories();
    let chests: Vec<Chest> = chest_points
        .into_iter()
        .enumerate()
        .map(|(idx, pos)| {
            let category = categories[idx % categories.len()];
            Chest::new(idx as u32 + 1, pos, category, drawn.next())
        })
        .collect();
    let unquizzed = chests.iter().filter(|chest| chest.question.is_none()).count();
    if unquizzed > 0 {
        tracing::warn!(
            zone = arena.theme.zone(),
            unquizzed,
            "question bank short, some chests open without a question"
        );
    }

    let mut anchors = vec![player_spawn];
    anchors.extend(chests.iter().map(|chest| chest.pos));
    let portal = Portal {
        pos: place_point(arena, &anchors, placement, rng),
        keys_required: config.keys_required,
    };

    let hostile_points = place_many(
        arena,
        config.hostile_count,
        &[player_spawn],
        config.hostile_spawn_placement(),
        rng,
    );
    let hostiles = hostile_points
        .into_iter()
        .enumerate()
        .map(|(idx, pos)| {
            Hostile::new(
                idx as u32 + 1,
                pos,
                random_direction(rng),
                config.hostile_speed,
                config.hostile_max_hp,
            )
        })
        .collect();

    Layout {
        player_spawn,
        chests,
        portal,
        hostiles,
    }
}
