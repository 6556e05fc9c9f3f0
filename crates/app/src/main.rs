//! Entry point for scenewalk.
//! Walks a generated hierarchy with a transform stack, then branches and
//! rebases it.

mod scene;

use anyhow::{Context, Result, bail};
use matstack::{
    DEFAULT_SINGULAR_EPSILON, LocalTransform, Mat4, StackError, TransformStack, Vec3,
};

use crate::scene::{Scene, node_count};

/// Settings read from `--key=value` arguments.
#[derive(Clone, Copy, Debug)]
struct Settings {
    depth: usize,
    fanout: usize,
    epsilon: f32,
    rebase_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depth: 3,
            fanout: 2,
            epsilon: DEFAULT_SINGULAR_EPSILON,
            rebase_scale: 2.0,
        }
    }
}

fn parse_settings(args: impl IntoIterator<Item = String>) -> Result<Settings> {
    let mut s = Settings::default();
    for arg in args {
        if let Some(v) = arg.strip_prefix("--depth=") {
            s.depth = v.parse().with_context(|| format!("invalid --depth '{}'", v))?;
        } else if let Some(v) = arg.strip_prefix("--fanout=") {
            s.fanout = v
                .parse()
                .with_context(|| format!("invalid --fanout '{}'", v))?;
        } else if let Some(v) = arg.strip_prefix("--epsilon=") {
            s.epsilon = v
                .parse()
                .with_context(|| format!("invalid --epsilon '{}'", v))?;
        } else if let Some(v) = arg.strip_prefix("--rebase-scale=") {
            s.rebase_scale = v
                .parse()
                .with_context(|| format!("invalid --rebase-scale '{}'", v))?;
        } else if arg.starts_with("--") {
            log::warn!("Ignoring unknown argument '{}'", arg);
        }
    }
    if s.depth == 0 {
        bail!("--depth must be at least 1");
    }
    if !s.rebase_scale.is_finite() || s.rebase_scale == 0.0 {
        bail!("--rebase-scale must be finite and non-zero");
    }
    node_count(s.depth, s.fanout)?;
    Ok(s)
}

fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// What [`demo_rebase`] observed on its branch.
#[derive(Debug)]
struct RebaseDemo {
    leaf_before: Mat4,
    leaf_after: Mat4,
    /// Error from rebasing below a flattened root, when the path is deep enough.
    singular: Option<StackError>,
    /// The branch was unchanged by that failed rebase.
    rolled_back: bool,
}

/// Branches `stack`, rescales its root level in the branch only, then
/// flattens the root and shows that the next deeper rebase rolls back.
fn demo_rebase(stack: &TransformStack, root: LocalTransform, scale: f32) -> Result<RebaseDemo> {
    let mut branch = stack.branch();
    let scaled = LocalTransform {
        scale: Vec3::splat(scale),
        ..root
    };
    branch
        .rebase(1, scaled.matrix())
        .context("rebasing root scale")?;
    let leaf_after = branch.peek();

    let mut singular = None;
    let mut rolled_back = false;
    if branch.depth() >= 3 {
        let flat = LocalTransform::from_scale(Vec3::new(1.0, 0.0, 1.0));
        branch
            .rebase(1, flat.matrix())
            .context("flattening root")?;
        let before = branch.clone();
        match branch.rebase(2, Mat4::IDENTITY) {
            Err(e @ StackError::NoInverse { .. }) => {
                rolled_back = branch == before;
                singular = Some(e);
            }
            Err(e) => return Err(e).context("rebasing below a flattened root"),
            Ok(()) => bail!("rebase below a flattened root unexpectedly succeeded"),
        }
    }

    Ok(RebaseDemo {
        leaf_before: stack.peek(),
        leaf_after,
        singular,
        rolled_back,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = parse_settings(std::env::args().skip(1))?;
    log::info!("Starting scenewalk: {:?}", settings);

    let scene = Scene::generate(settings.depth, settings.fanout)?;
    let mut stack = TransformStack::with_singular_epsilon(settings.epsilon);

    for visit in scene.walk(&mut stack)? {
        log::info!(
            "{:indent$}node {} at {}",
            "",
            visit.node,
            translation_of(&visit.world),
            indent = visit.depth * 2
        );
    }

    let path = scene.first_path();
    for local in &path {
        stack.push(local.matrix());
    }
    let demo = demo_rebase(&stack, path[0], settings.rebase_scale)?;
    log::info!(
        "Rebased root scale to {}: leaf x-axis length {} -> {}",
        settings.rebase_scale,
        demo.leaf_before.x_axis.truncate().length(),
        demo.leaf_after.x_axis.truncate().length()
    );
    match &demo.singular {
        Some(e) => log::info!("Expected failure: {} (rolled back: {})", e, demo.rolled_back),
        None => log::info!("Path too short to show a singular rebase"),
    }

    stack.unwind_to(1)?;
    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let s = parse_settings(args(&[])).unwrap();
        assert_eq!(s.depth, 3);
        assert_eq!(s.fanout, 2);
        assert_eq!(s.epsilon, DEFAULT_SINGULAR_EPSILON);
    }

    #[test]
    fn flags_override_defaults() {
        let s = parse_settings(args(&["--depth=5", "--fanout=1", "--epsilon=0.001"])).unwrap();
        assert_eq!(s.depth, 5);
        assert_eq!(s.fanout, 1);
        assert_eq!(s.epsilon, 0.001);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(parse_settings(args(&["--depth=many"])).is_err());
        assert!(parse_settings(args(&["--depth=0"])).is_err());
        assert!(parse_settings(args(&["--rebase-scale=0"])).is_err());
    }

    #[test]
    fn oversized_scene_is_rejected() {
        assert!(parse_settings(args(&["--fanout=18446744073709551615"])).is_err());
        assert!(parse_settings(args(&["--depth=40", "--fanout=4"])).is_err());
    }

    fn path_stack(depth: usize) -> (TransformStack, Vec<LocalTransform>) {
        let scene = Scene::generate(depth, 2).unwrap();
        let path = scene.first_path();
        let mut stack = TransformStack::new();
        for local in &path {
            stack.push(local.matrix());
        }
        (stack, path)
    }

    #[test]
    fn demo_rebase_changes_branch_only() {
        let (stack, path) = path_stack(3);
        let original = stack.clone();

        let demo = demo_rebase(&stack, path[0], 2.0).unwrap();
        assert_eq!(stack, original);
        assert_eq!(demo.leaf_before, original.peek());
        assert!(!demo.leaf_after.abs_diff_eq(demo.leaf_before, 1e-3));

        let before_len = demo.leaf_before.x_axis.truncate().length();
        let after_len = demo.leaf_after.x_axis.truncate().length();
        assert!((after_len - 2.0 * before_len).abs() < 1e-4);
    }

    #[test]
    fn demo_rebase_rolls_back_singular_rebase() {
        let (stack, path) = path_stack(3);
        let demo = demo_rebase(&stack, path[0], 2.0).unwrap();
        assert!(matches!(
            demo.singular,
            Some(StackError::NoInverse { index: 2, .. })
        ));
        assert!(demo.rolled_back);
    }

    #[test]
    fn demo_rebase_skips_singular_step_on_short_path() {
        let (stack, path) = path_stack(2);
        let demo = demo_rebase(&stack, path[0], 0.5).unwrap();
        assert!(demo.singular.is_none());
        assert!(!demo.rolled_back);
    }
}
