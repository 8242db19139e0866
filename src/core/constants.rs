// Parry timing
pub const PARRY_WINDOW_MS: u64 = 200;
pub const BULLET_TIME_BASE_MS: u64 = 300;
pub const BULLET_TIME_PER_LEVEL_MS: u64 = 100;
pub const BULLET_TIME_SCALE: f64 = 0.25;

// Upgrades
pub const MAX_UPGRADE_LEVEL: u8 = 4;
pub const UPGRADE_COSTS: [u32; MAX_UPGRADE_LEVEL as usize] = [20, 50, 90, 150]; // cost to go from level N to N+1
pub const DAMAGE_MULT_PER_LEVEL: f64 = 0.25;
pub const TETHER_SPEED_PER_LEVEL: f64 = 0.2;
pub const UPGRADE_SAVE_KEY: &str = "inkflip_upgrades";

// Player
pub const PLAYER_BASE_HP: u32 = 100;
pub const HP_PER_ABSORBENCY_LEVEL: u32 = 20;
pub const GUARD_DAMAGE_MULTIPLIER: f64 = 0.5;

// Enemy (Ink-Blot)
pub const ENEMY_BASE_HP: u32 = 60;
pub const ENEMY_HP_PER_FLOOR: u32 = 20;
pub const ENEMY_ATTACK_DAMAGE: u32 = 25;
pub const PARRY_REFLECT_MULTIPLIER: f64 = 1.5;
pub const DIRECT_HIT_MULTIPLIER: f64 = 0.6; // unparryable strikes land softer

// Skills: base damage before the pigment multiplier
pub const SLASH_DAMAGE: u32 = 20;
pub const GUARD_DAMAGE: u32 = 0;
pub const INK_SURGE_DAMAGE: u32 = 35;

// Rewards
pub const INKBLOT_INK_DROP: u32 = 15;
pub const INK_DROP_PER_FLOOR: u32 = 8;

// Encounter pacing (ms)
pub const COMBAT_START_DELAY_MS: u64 = 300;
pub const GUARD_DELAY_MS: u64 = 300;
pub const ATTACK_DELAY_MS: u64 = 400;
pub const ENEMY_WINDUP_MS: u64 = 800;
pub const PARRY_RESOLVE_DELAY_MS: u64 = 500;
pub const MISS_RESOLVE_DELAY_MS: u64 = 400;
pub const DIRECT_HIT_DELAY_MS: u64 = 600;
pub const ENEMY_DEATH_DELAY_MS: u64 = 600;
pub const VICTORY_DELAY_MS: u64 = 1200;

// Real-time frame rate used by the simulator
pub const REALTIME_FRAME_MS: u64 = 16;
