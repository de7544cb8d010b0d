use std::process;

use log::{error, info};
use slot_pool::{Pool, PoolConfig, PoolError};

#[derive(Default)]
struct Particle {
    position: [f32; 2],
    velocity: [f32; 2],
    age: u32,
}

const MAX_PARTICLES: usize = 64;
const FRAMES: u32 = 12;
const SPAWN_PER_FRAME: usize = 8;
const LIFETIME: u32 = 5;

fn run() -> Result<(), anyhow::Error> {
    let config = PoolConfig::new(16).with_max_capacity(MAX_PARTICLES);
    let pool = Pool::with_config(Particle::default, config)?;
    let mut live = Vec::new();

    for frame in 0..FRAMES {
        for i in 0..SPAWN_PER_FRAME {
            let mut handle = match pool.acquire() {
                Ok(handle) => handle,
                Err(PoolError::Exhausted { capacity }) => {
                    info!("frame {}: pool full at {} particles", frame, capacity);
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            if let Some(mut particle) = handle.data_mut() {
                particle.position = [0.0, 0.0];
                particle.velocity = [i as f32, frame as f32];
                particle.age = 0;
            }
            live.push(handle);
        }

        for handle in live.iter_mut() {
            if let Some(mut guard) = handle.data_mut() {
                let particle = &mut *guard;
                particle.position[0] += particle.velocity[0];
                particle.position[1] += particle.velocity[1];
                particle.age += 1;
            }
        }
        // dropping a handle returns its slot
        live.retain(|handle| match handle.data() {
            Some(particle) => particle.age < LIFETIME,
            None => false,
        });

        info!(
            "frame {}: {} live, {} slots, {} available",
            frame,
            pool.in_use(),
            pool.len(),
            pool.available()
        );
    }

    live.clear();
    pool.release_all();
    info!("done: {} slots allocated, {} in use", pool.len(), pool.in_use());
    Ok(())
}

fn main() {
    env_logger::init();
    run().unwrap_or_else(|err| {
        error!("failed to run particle demo: {}", err);
        process::exit(1);
    });
}
