use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, warn};

use crate::{
    domain::{Actuators, Command},
    ecs::{ComponentKind, DiffDriveWheels, EntityMut, Signature, System, SystemContext},
    engine::Scene,
    runner::CommandPolicy,
};

/// Applies `command` to the wheel targets and the actuator echo.
pub fn apply_command(command: &Command, wheels: &mut DiffDriveWheels, actuators: &mut Actuators) {
    if command.has_non_finite_velocity() {
        warn!(?command, "ignoring non-finite velocity");
    }
    let (left, right) = command.wheel_targets(
        (wheels.left, wheels.right),
        wheels.wheel_radius,
        wheels.wheel_base,
    );
    wheels.left = left;
    wheels.right = right;
    actuators.apply(command);
}

/// Pulls queued commands without blocking. An empty queue is the normal case.
pub struct GetInput {
    commands: Receiver<Command>,
    policy: CommandPolicy,
    disconnected: bool,
}

impl GetInput {
    pub fn new(commands: Receiver<Command>, policy: CommandPolicy) -> Self {
        Self {
            commands,
            policy,
            disconnected: false,
        }
    }
}

impl System<Scene> for GetInput {
    fn name(&self) -> &'static str {
        "get_input"
    }

    fn signature(&self) -> Signature {
        Signature::of(&[ComponentKind::DiffDriveWheels])
    }

    fn update(&mut self, entity: EntityMut<'_>, ctx: &mut SystemContext<'_, Scene>, _dt: f64) {
        let Some(wheels) = entity.wheels else {
            return;
        };
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    debug!(?command, time = ctx.time, "command received");
                    apply_command(&command, wheels, &mut ctx.resources.actuators);
                    if self.policy == CommandPolicy::OnePerTick {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("command channel disconnected");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;
    use crate::{domain::GripperState, ecs::World, tests::open_scene};

    fn world(policy: CommandPolicy) -> (World<Scene>, crossbeam_channel::Sender<Command>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut world = World::new(open_scene());
        world
            .create_entity([DiffDriveWheels::new(1.0, 0.3).into()])
            .unwrap();
        world.add_system(GetInput::new(rx, policy));
        (world, tx)
    }

    fn wheels(world: &World<Scene>) -> (f64, f64) {
        let entity = world.entities().next().unwrap();
        let wheels = world.get::<DiffDriveWheels>(entity).unwrap();
        (wheels.left, wheels.right)
    }

    #[rstest]
    #[case::drain_all(CommandPolicy::DrainAll, vec![(0.3, 0.3)])]
    #[case::one_per_tick(CommandPolicy::OnePerTick, vec![(0.1, 0.1), (0.2, 0.2), (0.3, 0.3)])]
    fn test_command_policy(#[case] policy: CommandPolicy, #[case] expected: Vec<(f64, f64)>) {
        let (mut world, tx) = world(policy);
        for v in [0.1, 0.2, 0.3] {
            tx.send(Command::velocity(v, 0.0)).unwrap();
        }
        for (left, right) in expected {
            world.step(0.01);
            let actual = wheels(&world);
            assert_abs_diff_eq!(actual.0, left, epsilon = 1e-12);
            assert_abs_diff_eq!(actual.1, right, epsilon = 1e-12);
        }
        world.step(0.01);
        assert_abs_diff_eq!(wheels(&world).0, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_drain_all_keeps_latest_per_field() {
        let (mut world, tx) = world(CommandPolicy::DrainAll);
        tx.send(Command::wheels(1.0, 2.0)).unwrap();
        tx.send(Command::gripper(true)).unwrap();
        tx.send(Command {
            wheel_vel_right: Some(-1.0),
            ..Default::default()
        })
        .unwrap();
        world.step(0.01);
        assert_eq!(wheels(&world), (1.0, -1.0));
        assert_eq!(world.resources().actuators.gripper, GripperState::Closed);
    }

    #[test]
    fn test_disconnected_channel_is_not_fatal() {
        let (mut world, tx) = world(CommandPolicy::DrainAll);
        tx.send(Command::wheels(0.5, 0.5)).unwrap();
        drop(tx);
        world.step(0.01);
        world.step(0.01);
        assert_eq!(wheels(&world), (0.5, 0.5));
    }
}
